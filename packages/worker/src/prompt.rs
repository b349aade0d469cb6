// ABOUTME: System prompt construction for agent runs
// ABOUTME: Combines the agent preamble, the job's source context, and workflow guidelines

use kiln_core::{constants::SANDBOX_WORKSPACE, Job};

/// Task instruction passed on the agent command line; the details live in the system prompt
pub const USER_PROMPT: &str = "Complete the task described in the context above. \
     Use the available tools to explore, create, edit, and run code in the workspace.";

/// `owner/repo` when an owner is known, the bare repo name otherwise
pub fn full_repo_name(gh_owner: Option<&str>, repo: &str) -> String {
    match gh_owner {
        Some(owner) => format!("{}/{}", owner, repo),
        None => repo.to_string(),
    }
}

pub fn build_system_prompt(job: &Job, gh_owner: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an autonomous software engineering agent running inside a Docker sandbox.\n\
         Your workspace is {ws}. All file paths are relative to that directory.\n\n\
         {context}\n\n\
         ## Guidelines\n\
         - Explore the workspace before making changes (list files, read code).\n\
         - After editing files, verify your changes (read the file back, run tests if applicable).\n",
        ws = SANDBOX_WORKSPACE,
        context = job.context_block(),
    );

    match job.repo.as_deref() {
        Some(repo) => {
            prompt.push_str(&format!(
                "- When you are done, provide a concise summary of what you did.\n\n\
                 ## Git workflow\n\
                 A GitHub repository ({}) has been cloned to {}.\n\
                 - Create a new branch with a descriptive name for your changes.\n\
                 - Make your changes, verify them (run tests if applicable).\n\
                 - Commit with clear messages.\n\
                 - Push the branch and create a pull request using `gh pr create`.\n\
                 - Include a clear PR title and description of what you changed and why.\n",
                full_repo_name(gh_owner, repo),
                SANDBOX_WORKSPACE
            ));
        }
        None => prompt.push_str(
            "- Do NOT attempt to access the internet or external services.\n\
             - When you are done, provide a concise summary of what you did.\n",
        ),
    }

    prompt
}
