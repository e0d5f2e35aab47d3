//! Built-in session prompts.

use std::path::Path;

/// Prompt for the first session of a new project.
pub const INITIALIZER_PROMPT: &str = r#"You are the first agent in a long-running autonomous coding effort.

Project directory: {project_dir}
Model: {model}

Read the product specification in `{spec_file}`. Then:
1. Break the specification down into a list of end-to-end features and
   write it to a file in the project directory so later sessions can track
   progress.
2. Create an `init.sh` script that installs dependencies and starts the
   development environment.
3. Set up the project skeleton, initialize a git repository, and commit.

Leave the project in a clean, working state before you finish.
"#;

/// Prompt for every later session.
pub const CODING_PROMPT: &str = r#"You are continuing a long-running autonomous coding effort (session {iteration}).

Project directory: {project_dir}
Model: {model}

Start by getting your bearings: read `{spec_file}`, the feature list and
progress notes left by earlier sessions, and the recent git log. Run
`init.sh` and verify the features marked as done still work.

Then pick the highest-priority unfinished feature, implement it, and test
it end to end. Update the progress notes, commit your work, and leave the
project in a clean, working state before you finish.
"#;

/// Values substituted into a prompt template.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Project directory.
    pub project_dir: &'a Path,
    /// Name of the seeded spec file, relative to the project directory.
    pub spec_file: &'a str,
    /// Model identifier.
    pub model: &'a str,
    /// 1-based iteration number.
    pub iteration: u32,
}

/// Substitutes `{project_dir}`, `{spec_file}`, `{model}` and `{iteration}`.
#[must_use]
pub fn render(template: &str, ctx: &PromptContext<'_>) -> String {
    template
        .replace("{project_dir}", &ctx.project_dir.display().to_string())
        .replace("{spec_file}", ctx.spec_file)
        .replace("{model}", ctx.model)
        .replace("{iteration}", &ctx.iteration.to_string())
}
