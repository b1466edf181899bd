use isg_core::error::IsgError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), IsgError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
