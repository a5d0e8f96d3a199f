use crate::address::{parse_line, Address};
use crate::AddressResult;

/// Parses newline-delimited text into a list of addresses
///
/// Every line must hold one absolute URL. Parsing stops at the first invalid
/// line and reports its 1-based line number; blank lines are invalid too.
/// Both `\n` and `\r\n` line endings are accepted, and a trailing newline does
/// not produce an extra line.
///
/// # Example
///
/// ```
/// use linkscope::gather_addresses;
///
/// let addresses = gather_addresses("https://a.example/\nhttps://b.example/\n").unwrap();
/// assert_eq!(addresses.len(), 2);
///
/// let err = gather_addresses("https://a.example/\nnot a url").unwrap_err();
/// assert_eq!(err.line(), 2);
/// ```
pub fn gather_addresses(text: &str) -> AddressResult<Vec<Address>> {
    let mut addresses = Vec::with_capacity(64);

    for (index, line) in text.lines().enumerate() {
        addresses.push(parse_line(line, index + 1)?);
    }

    Ok(addresses)
}
