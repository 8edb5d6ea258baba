use anyhow::Result;
use dialoguer::{Input, Password, Select};

/// Arrow-key Yes/No selection. `Ok(true)` when "Yes" is picked.
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_overwrite_confirmation(instance: &str) -> Result<bool> {
    prompt_confirmation(&format!("Instance '{}' already exists. Overwrite?", instance), false)
}

pub fn prompt_delete_confirmation(count: usize) -> Result<bool> {
    prompt_confirmation(&format!("Delete {} page(s)? This cannot be undone.", count), false)
}

pub fn prompt_url(default: Option<String>) -> Result<String> {
    match default {
        Some(url) => Ok(url),
        None => Ok(Input::<String>::new()
            .with_prompt("GraphQL endpoint (e.g. https://wiki.example.com/graphql)")
            .interact_text()?),
    }
}

pub fn prompt_api_key(default: Option<String>) -> Result<String> {
    match default {
        Some(key) => Ok(key),
        None => Ok(Password::new().with_prompt("API key").interact()?),
    }
}
