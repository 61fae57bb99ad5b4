//! Tests for error handling

use projgen_core::error::{ConfigError, GenError, Result};
use projgen_core::types::Address;

#[test]
fn test_layout_unresolved_names_the_type()
{
    let error = GenError::LayoutUnresolved {
        type_name: "Widget".to_string(),
        reason: "primary base `Base` is virtual".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("Widget"));
    assert!(message.contains("virtual"));
}

#[test]
fn test_memory_read_message()
{
    let error = GenError::MemoryRead {
        address: Address::new(0x40),
        length: 8,
        reason: "unmapped".to_string(),
    };
    let message = format!("{error}");
    assert!(message.contains("8 bytes"));
    assert!(message.contains("0x0000000000000040"));
}

#[test]
fn test_config_error_converts()
{
    let config = ConfigError::DuplicateTransformation("Handle".to_string());
    let error: GenError = config.into();
    assert!(matches!(error, GenError::Config(ConfigError::DuplicateTransformation(_))));
    assert!(error.to_string().contains("Handle"));
}

#[test]
fn test_io_error_converts()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: GenError = io.into();
    assert!(matches!(error, GenError::Io(_)));
}

#[test]
fn test_result_alias()
{
    fn fails() -> Result<u32>
    {
        Err(GenError::UnknownTypeName("Nope".to_string()))
    }
    assert!(fails().is_err());
}
