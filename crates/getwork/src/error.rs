use super::*;

#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
    #[snafu(display("invalid hex string `{input}`"))]
    Hex { input: String },
    #[snafu(display("invalid hex quantity `{input}`"))]
    Quantity { input: String },
    #[snafu(display("expected {expected} bytes, got {actual}"))]
    Length { expected: usize, actual: usize },
}
