//! Prompt construction for the three model-backed stages.
//!
//! Pure string building, no I/O. Each builder returns a [`PromptPair`]
//! that converts into a [`Conversation`].

use crate::llm::Conversation;

/// Persona line shared by every system prompt.
const PERSONA: &str = "You are an AI developer who is trying to write a program that will \
                       generate code for the user based on their intent.";

/// Placeholder shown to the model when no shared-dependency memo exists.
const NO_SHARED_DEPENDENCIES: &str = "(none decided yet)";

/// A system prompt and the first user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn into_conversation(self) -> Conversation {
        Conversation::new(self.system, self.user)
    }
}

/// Prompt for the planning stage: an exhaustive list of file paths.
pub fn plan_prompt(intent: &str) -> PromptPair {
    let system = format!(
        r#"{PERSONA}

When given their intent, create a complete, exhaustive list of filepaths that the user would write to make the program. Only list complete filepaths.

Only list the filepaths you would write, and return them as a list of strings separated by commas.
Do not add any explanation or markup. Only return a list of filepaths in a list format.

good response:
["templates/index.html", "app.py"]

bad response:
templates/
    index.html
"#
    );

    PromptPair {
        system,
        user: intent.to_string(),
    }
}

/// Prompt for the shared-dependency stage.
///
/// `file_list` is the raw plan text exactly as persisted.
pub fn dependency_prompt(intent: &str, file_list: &str) -> PromptPair {
    let system = format!(
        r#"{PERSONA}

In response to the user's prompt:

---
the app is: {intent}
---

the files we have decided to generate are: {file_list}

Now that we have a list of files, we need to understand what dependencies they share.
Please name and briefly describe what is shared between the files we are generating, including exported variables, data schemas, id names of every DOM elements that javascript functions will use, message names, and function names.
Exclusively focus on the names of the shared dependencies, and do not add any other explanation.
"#
    );

    PromptPair {
        system,
        user: intent.to_string(),
    }
}

/// Inputs for [`file_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct FilePromptInput<'a> {
    pub intent: &'a str,
    /// Raw plan text as persisted.
    pub file_list: &'a str,
    pub shared_dependencies: Option<&'a str>,
    /// Path of the one file to generate.
    pub filename: &'a str,
    /// Contents of already-written planned files. `Some` only in coherent
    /// mode.
    pub context: Option<&'a str>,
}

/// Prompt for generating a single file.
pub fn file_prompt(input: &FilePromptInput<'_>) -> PromptPair {
    let FilePromptInput {
        intent,
        file_list,
        shared_dependencies,
        filename,
        context,
    } = *input;
    let shared = shared_dependencies.unwrap_or(NO_SHARED_DEPENDENCIES);

    let system = format!(
        r#"{PERSONA}

the app is: {intent}

the files we have decided to generate are: {file_list}

the shared dependencies (like filenames and variable names) we have decided on are: {shared}

only write valid code for the given filepath and file type, and return only the code.
do not add any other explanation, only return valid code for that file type.
"#
    );

    let mut user = String::with_capacity(2048);
    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        user.push_str("We have already written the following files. Stay consistent with them:\n\n");
        user.push_str(ctx);
        user.push('\n');
    }
    user.push_str(&format!(
        r#"We have broken up the program into per-file generation.
Now your job is to generate only the code for the file {filename}.
Make sure to have consistent filenames if you reference other files we are also generating.

Remember that you must obey 3 things:
   - you are generating code for the file {filename}
   - do not stray from the names of the files and the shared dependencies we have decided on
   - MOST IMPORTANT OF ALL - the purpose of our app is {intent} - every line of code you generate must be valid code. Do not include code fences in your response, for example

Bad response:
```javascript
console.log("hello world")
```

Good response:
console.log("hello world")

Begin generating the code now.
"#
    ));

    PromptPair { system, user }
}
