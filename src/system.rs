use crate::error::{MingoError, Result};
use tracing::debug;

/// Name of the user running the process
pub fn username() -> Result<String> {
    if let Some(name) = lookup_username() {
        return Ok(name);
    }

    debug!("Password database lookup failed, falling back to environment");
    env_non_empty(&["USER", "USERNAME", "LOGNAME"]).ok_or(MingoError::UnknownUser)
}

/// Network name of this host
pub fn hostname() -> Result<String> {
    if let Some(name) = lookup_hostname() {
        return Ok(name);
    }

    env_non_empty(&["HOSTNAME", "COMPUTERNAME"]).ok_or(MingoError::UnknownHost)
}

fn env_non_empty(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(unix)]
fn lookup_username() -> Option<String> {
    use std::ffi::CStr;

    let uid = unsafe { libc::geteuid() };
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }
        break;
    }

    let name = unsafe { CStr::from_ptr(pwd.pw_name) };
    name.to_str()
        .ok()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(not(unix))]
fn lookup_username() -> Option<String> {
    None
}

#[cfg(unix)]
fn lookup_hostname() -> Option<String> {
    let mut buf = vec![0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return None;
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(end);
    String::from_utf8(buf).ok().filter(|name| !name.is_empty())
}

#[cfg(not(unix))]
fn lookup_hostname() -> Option<String> {
    None
}
