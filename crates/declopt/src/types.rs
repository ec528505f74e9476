//! Value type validation.
//!
//! Every type is a predicate over the raw string. A handful of types need the
//! host system (filesystem, user and group databases, name resolution); those
//! go through [`SystemLookup`] so they can be swapped out.

use std::collections::HashMap;
use std::fs;
use std::io::IsTerminal;
use std::net::{Ipv6Addr, ToSocketAddrs};
use std::path::Path;

use crate::error::ConfigError;

/// Host databases consulted by the `username`, `group`, `port` and
/// `hostname` types.
pub trait SystemLookup {
    fn user_exists(&self, name: &str) -> bool;
    fn group_exists(&self, name: &str) -> bool;
    fn service_exists(&self, name: &str) -> bool;
    fn resolves(&self, host: &str) -> bool;
}

/// Asks the C library's name service switch for users, groups and services,
/// and the system resolver for host names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDatabase;

#[cfg(unix)]
mod nss {
    use std::ffi::CString;
    use std::ptr;

    const INITIAL_BUFFER: usize = 1024;
    const MAX_BUFFER: usize = 1 << 20;

    /// Run a reentrant `get*nam_r` call, growing the scratch buffer on `ERANGE`.
    fn lookup_r<T>(
        name: &str,
        call: impl Fn(*const libc::c_char, *mut T, *mut libc::c_char, usize, *mut *mut T) -> libc::c_int,
    ) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER];
        loop {
            let mut entry = std::mem::MaybeUninit::<T>::uninit();
            let mut result: *mut T = ptr::null_mut();
            let rc = call(
                name.as_ptr(),
                entry.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result as *mut *mut T,
            );
            if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
                buf.resize(buf.len() * 2, 0);
                continue;
            }
            if rc != 0 {
                tracing::debug!(rc, "name service lookup failed");
            }
            return rc == 0 && !result.is_null();
        }
    }

    pub(super) fn user_exists(name: &str) -> bool {
        lookup_r::<libc::passwd>(name, |name, pwd, buf, len, result| unsafe {
            libc::getpwnam_r(name, pwd, buf, len, result)
        })
    }

    pub(super) fn group_exists(name: &str) -> bool {
        lookup_r::<libc::group>(name, |name, grp, buf, len, result| unsafe {
            libc::getgrnam_r(name, grp, buf, len, result)
        })
    }

    pub(super) fn service_exists(name: &str) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        // Any protocol matches.
        unsafe { !libc::getservbyname(name.as_ptr(), ptr::null()).is_null() }
    }
}

#[cfg(not(unix))]
mod nss {
    pub(super) fn user_exists(_: &str) -> bool {
        false
    }

    pub(super) fn group_exists(_: &str) -> bool {
        false
    }

    pub(super) fn service_exists(_: &str) -> bool {
        false
    }
}

impl SystemLookup for SystemDatabase {
    fn user_exists(&self, name: &str) -> bool {
        nss::user_exists(name)
    }

    fn group_exists(&self, name: &str) -> bool {
        nss::group_exists(name)
    }

    fn service_exists(&self, name: &str) -> bool {
        nss::service_exists(name)
    }

    fn resolves(&self, host: &str) -> bool {
        match (host, 0u16).to_socket_addrs() {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(err) => {
                tracing::debug!(host, %err, "host name did not resolve");
                false
            }
        }
    }
}

/// Caller-provided predicate for a type the crate does not know.
pub type TypeCheck = Box<dyn Fn(&str) -> bool>;

/// Built-in types plus caller extensions.
pub struct TypeValidator {
    custom: HashMap<String, TypeCheck>,
    lookup: Box<dyn SystemLookup>,
}

impl Default for TypeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeValidator")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TypeValidator {
    pub fn new() -> Self {
        Self::with_lookup(SystemDatabase)
    }

    pub fn with_lookup(lookup: impl SystemLookup + 'static) -> Self {
        Self {
            custom: HashMap::new(),
            lookup: Box::new(lookup),
        }
    }

    pub fn set_lookup(&mut self, lookup: impl SystemLookup + 'static) {
        self.lookup = Box::new(lookup);
    }

    /// Register a validator for `name` (case-insensitive).
    pub fn register(&mut self, name: &str, check: impl Fn(&str) -> bool + 'static) {
        self.custom.insert(name.to_ascii_lowercase(), Box::new(check));
    }

    /// Whether `value` is a valid `type_name`.
    ///
    /// `Err` means nothing knows how to validate `type_name`, which is a
    /// setup mistake rather than a bad value.
    pub fn check(&self, type_name: &str, value: &str) -> Result<bool, ConfigError> {
        let lookup = self.lookup.as_ref();
        let ty = type_name.to_ascii_lowercase();
        let valid = match ty.as_str() {
            "file" => Path::new(value).is_file(),
            "directory" => Path::new(value).is_dir(),
            "pipe" => is_fifo(value),
            "socket" => is_socket(value),
            "link" => fs::symlink_metadata(value)
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false),
            "terminal" => is_terminal_fd(value),
            "char" => is_char(value),
            "uint" | "unsignedint" => is_uint(value),
            "int" | "integer" => is_int(value),
            "hexa" => is_hexa(value),
            "ipv4" => is_ipv4(value),
            "ipv6" => is_ipv6(value),
            "ip" => is_ip(value),
            "hostname" => lookup.resolves(value),
            "host" => is_ip(value) || lookup.resolves(value),
            "portnumber" => is_port_number(value),
            "port" => is_port_number(value) || lookup.service_exists(value),
            "username" => lookup.user_exists(value),
            "group" => lookup.group_exists(value),
            _ => match self.custom.get(&ty) {
                Some(check) => check(value),
                None => return Err(ConfigError::MissingValidator(type_name.to_string())),
            },
        };
        tracing::trace!(type_name, value, valid, "type check");
        Ok(valid)
    }
}

pub fn is_char(value: &str) -> bool {
    value.chars().count() == 1
}

pub fn is_uint(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_int(value: &str) -> bool {
    is_uint(value.strip_prefix('-').unwrap_or(value))
}

pub fn is_hexa(value: &str) -> bool {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn is_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|o| is_uint(o) && o.len() <= 3 && o.parse::<u16>().is_ok_and(|n| n <= 255))
}

pub fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

pub fn is_ip(value: &str) -> bool {
    is_ipv4(value) || is_ipv6(value)
}

/// A uint in (0, 65536).
pub fn is_port_number(value: &str) -> bool {
    is_uint(value) && value.parse::<u32>().is_ok_and(|n| n > 0 && n < 65536)
}

#[cfg(unix)]
fn is_fifo(path: &str) -> bool {
    use std::os::unix::fs::FileTypeExt;
    fs::metadata(path).is_ok_and(|m| m.file_type().is_fifo())
}

#[cfg(unix)]
fn is_socket(path: &str) -> bool {
    use std::os::unix::fs::FileTypeExt;
    fs::metadata(path).is_ok_and(|m| m.file_type().is_socket())
}

#[cfg(not(unix))]
fn is_fifo(_path: &str) -> bool {
    false
}

#[cfg(not(unix))]
fn is_socket(_path: &str) -> bool {
    false
}

// Only the standard streams can be inspected without taking ownership of a raw fd.
fn is_terminal_fd(value: &str) -> bool {
    match value {
        "0" => std::io::stdin().is_terminal(),
        "1" => std::io::stdout().is_terminal(),
        "2" => std::io::stderr().is_terminal(),
        _ => false,
    }
}
