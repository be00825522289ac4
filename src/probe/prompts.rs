pub const LOADING_ORDER_PROMPT: &str =
    "Hello! Please respond with a simple greeting and tell me what files you can see.";

pub const ASK_PROMPT: &str = r#"Report the prompt configuration files loaded in this session, with their priority and content.

Specifically:
1. Which prompt files were loaded? (for example CLAUDE.md, .claude/system.md)
2. In which order were they loaded?
3. What is the content or purpose of each file?
4. How is priority resolved between them?

Explain in as much detail as you can."#;

pub const VERIFY_EXTERNAL_PROMPT: &str = r#"Report the following about the system prompt you were given:

1. **Prompt source**: where was the prompt loaded from (is a file name mentioned)?
2. **Your role**: what role does the system prompt define for you?
3. **Available tools**: which tools does the system prompt name?
4. **Output format**: which output format does the system prompt require?
5. **Key instructions**: list the three most important instructions.
6. **Opening**: quote roughly the first 100 characters of the system prompt.

Answer clearly, as a bulleted list."#;

pub const VERIFY_PRESET_PROMPT: &str = r#"Report on the prompt files loaded because project settings were enabled:

1. **Loaded files**: which prompt files were loaded?
   - contents of CLAUDE.md
   - contents of .claude/system.md
   - contents of .claude/instructions.md
2. **Priority**: how is priority resolved between these files?
3. **First sentence of each file**: quote the opening of each file.

Answer clearly."#;

pub const COMBINED_PROMPT: &str = r#"Report on the system prompt you were given:

1. **Loaded prompt files**:
   - Is the content of CLAUDE.md included?
   - Is the content of Design.md included?
2. **Your role**:
   - What role does CLAUDE.md define?
   - What role does Design.md define?
   - Which of the two takes precedence?
3. **Opening**: quote roughly the first 100 characters of the system prompt.
4. **Priority**:
   - Which prompt takes precedence?
   - Were both prompts merged, or only one used?

Answer clearly."#;

pub const APPEND_PROMPT: &str = r#"Report on the system prompt you were given:

1. Does it contain the built-in coding-assistant instructions?
2. Does it contain the content of Design.md? Where does it appear relative to the built-in instructions?
3. Does it contain the content of CLAUDE.md? Where does it appear?
4. When the built-in instructions, Design.md and CLAUDE.md disagree, which one wins?

Answer clearly."#;

pub const DEFAULT_DESIGN_TASK: &str = r#"Please review and provide design recommendations for a user authentication system.

Consider:
1. Architecture patterns (MVC, microservices, etc.)
2. Security best practices
3. User experience flow
4. Component structure
5. Scalability considerations

Provide your analysis in the ADR format specified in your guidelines."#;
