use crate::core::{
    context::LibraryContext, error::Result, output::print_key_count, print_section_header,
};
use std::path::Path;

pub fn execute_lists(config_path: Option<&Path>) -> Result<()> {
    let context = LibraryContext::initialize(config_path)?;
    context.load_cache()?;

    let keys = context.store.list_keys();
    let width = keys.iter().map(String::len).max().unwrap_or(0);

    print_section_header("Cache");
    for key in &keys {
        print_key_count(key, context.store.list_len(key), width);
    }
    println!();
    Ok(())
}
