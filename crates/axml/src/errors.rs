use thiserror::Error;

/// Errors raised while decoding `resources.arsc`.
///
/// Variant names follow the error taxonomy of the binary resource format itself
/// (truncation, bad headers, overflow, malformed string payloads) rather than
/// the internal parser stage that detected them.
#[derive(Error, Debug)]
pub enum ArscError {
    /// A declared chunk size exceeds the bytes actually available.
    #[error("resource table truncated: declared size {declared}, only {available} bytes available")]
    Truncated { declared: u32, available: usize },

    /// `header_size` exceeded `size`, or the chunk was too small for its declared type.
    #[error("bad resource table header: {0}")]
    BadHeader(&'static str),

    /// An in-chunk offset plus length would have read past the chunk boundary.
    #[error("offset/length arithmetic escaped the enclosing chunk")]
    Overflow,

    /// A string pool entry was not valid UTF-8.
    #[error("malformed UTF-8 string payload in string pool")]
    BadUtf8,

    /// A string pool entry was not valid UTF-16.
    #[error("malformed UTF-16 string payload in string pool")]
    BadUtf16,

    /// `get_resource` could not find the requested package.
    #[error("package 0x{0:02x} not found")]
    NotFoundPackage(u8),

    /// `get_resource` found the package but no entry table table satisfied the request.
    #[error("entry {entry} of type 0x{type_id:02x} not found in package 0x{package:02x}")]
    NotFoundEntry { package: u8, type_id: u8, entry: u16 },
}

/// Errors raised while decoding a binary XML document (e.g. `AndroidManifest.xml`).
#[derive(Error, Debug)]
pub enum AxmlError {
    /// A declared chunk size exceeds the bytes actually available.
    #[error("binary xml truncated: declared size {declared}, only {available} bytes available")]
    Truncated { declared: u32, available: usize },

    /// `header_size` exceeded `size`, or the chunk was too small for its declared type.
    #[error("bad xml chunk header: {0}")]
    BadHeader(&'static str),

    /// An in-chunk offset plus length would have read past the chunk boundary.
    #[error("offset/length arithmetic escaped the enclosing chunk")]
    Overflow,

    /// A string pool entry was not valid UTF-8.
    #[error("malformed UTF-8 string payload in string pool")]
    BadUtf8,

    /// A string pool entry was not valid UTF-16.
    #[error("malformed UTF-16 string payload in string pool")]
    BadUtf16,

    /// The document produced no root element.
    #[error("xml document has no root element")]
    MissingRoot,
}

/// Errors raised while resolving a typed attribute value (`Bool`/`Int32`/`Str`, §4.6).
#[derive(Error, Debug)]
pub enum ValueError {
    /// The attribute text looked like a `@0x...` reference but failed to resolve.
    #[error(transparent)]
    Lookup(#[from] ArscError),

    /// The `@0x...` form did not parse as 8 hex digits.
    #[error("attribute value is not a valid `@0x...` resource reference")]
    BadResourceId,

    /// The resolved resource's dynamic kind does not match the accessor that was called.
    #[error("resolved resource value does not match the requested type")]
    TypeMismatch,

    /// A reference was encountered but no resource table was bound to this value.
    #[error("no resource table bound to resolve a `@0x...` reference")]
    NoTable,
}
