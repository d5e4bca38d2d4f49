use crate::{PakError, PakResult};
use mlua::Lua;

/// Compiles Lua source into bytecode ready to be embedded into the archive.
/// A fresh VM is created for every call and dropped afterwards.
pub fn compile(source: &str, chunk_name: &str) -> PakResult<Vec<u8>> {
    let lua = Lua::new();
    let function = lua
        .load(source)
        .set_name(chunk_name)
        .into_function()
        .map_err(|e| PakError::CompileError(e.to_string()))?;

    // Debug info is kept, runtime errors still report script lines
    Ok(function.dump(false))
}
