//! Process exit codes, values from BSD sysexits.h

/// Bad arguments or unknown enum value on the command line
pub const USAGE: i32 = 64;

/// Hierarchy or attribute rule rejected the edit
pub const DATAERR: i32 = 65;

/// Node document not found
pub const NOINPUT: i32 = 66;

/// Drag controller misuse
pub const SOFTWARE: i32 = 70;

/// Refused to overwrite an existing document
pub const CANTCREAT: i32 = 73;

/// Reading, parsing or writing a file failed
pub const IOERR: i32 = 74;

/// Settings could not be loaded or are unusable
pub const CONFIG: i32 = 78;
