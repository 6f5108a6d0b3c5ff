//! JSON Input Utilities
//!
//! Reading typed-data documents and other JSON inputs with error handling
//! that maps onto [`VerifierError`] codes.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::eip712::TypedData;
use crate::error::{VerifierError, VerifierResult};

/// Read a file, or stdin when `path` is `-`
pub fn read_input(path: &Path) -> VerifierResult<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }

    fs::read_to_string(path).map_err(|e| {
        VerifierError::invalid_input(format!("cannot read {}", path.display())).with_details(e.to_string())
    })
}

/// Load and parse a typed-data document
pub fn load_typed_data(path: &Path) -> VerifierResult<TypedData> {
    let contents = read_input(path)?;
    Ok(TypedData::from_json(&contents)?)
}
