//! C ABI over the alignment facade.
//!
//! Handles are opaque to C. A handle must be freed with `sb_aligner_free`
//! and must not be used from two threads at once. Strings returned by the
//! alignment functions are owned by the caller and released with
//! `sb_string_free`.

#![allow(clippy::missing_safety_doc)]

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::sync::OnceLock;

use crate::alignment::session::{AlignmentSession, EMPTY_JSON_ARRAY};
use crate::config::AlignerConfig;
use crate::pipeline::builder::CtcAlignerLoader;

/// Opaque alignment session handle.
pub struct SbAlignerHandle {
    session: AlignmentSession,
}

impl SbAlignerHandle {
    pub(crate) fn into_raw(session: AlignmentSession) -> *mut Self {
        Box::into_raw(Box::new(Self { session }))
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(message).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Option<&'a str> {
    if ptr.is_null() {
        set_last_error(&format!("{name} is null"));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            set_last_error(&format!("{name} is not valid UTF-8"));
            None
        }
    }
}

fn into_c_string(json: String) -> *mut c_char {
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(_) => {
            set_last_error("alignment output contains an interior NUL byte");
            CString::new(EMPTY_JSON_ARRAY)
                .map(CString::into_raw)
                .unwrap_or(std::ptr::null_mut())
        }
    }
}

/// Creates an alignment session from a JSON [`AlignerConfig`].
///
/// The model is loaded on the first alignment call. Returns null when the
/// JSON cannot be parsed; see `sb_last_error`.
#[no_mangle]
pub unsafe extern "C" fn sb_aligner_new(config_json: *const c_char) -> *mut SbAlignerHandle {
    clear_last_error();
    let Some(json) = str_arg(config_json, "config_json") else {
        return std::ptr::null_mut();
    };
    let config = match AlignerConfig::from_json(json) {
        Ok(config) => config,
        Err(err) => {
            set_last_error(&err.to_string());
            return std::ptr::null_mut();
        }
    };
    tracing::debug!(model_path = %config.model_path, "creating aligner handle");
    let language = config.language.clone();
    let session = AlignmentSession::new(CtcAlignerLoader::new(config)).with_language(language);
    SbAlignerHandle::into_raw(session)
}

#[no_mangle]
pub unsafe extern "C" fn sb_aligner_free(handle: *mut SbAlignerHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Aligns `text` against the audio file at `path`.
///
/// Returns a JSON array (`"[]"` on alignment failure), or null when an
/// argument is null or not UTF-8.
#[no_mangle]
pub unsafe extern "C" fn sb_align_file(
    handle: *mut SbAlignerHandle,
    path: *const c_char,
    text: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(handle) = handle.as_mut() else {
        set_last_error("handle is null");
        return std::ptr::null_mut();
    };
    let (Some(path), Some(text)) = (str_arg(path, "path"), str_arg(text, "text")) else {
        return std::ptr::null_mut();
    };
    into_c_string(handle.session.get_word_timestamps(path, text))
}

/// Aligns `text` against `len` bytes of little-endian PCM16 mono audio.
///
/// `bytes` may be null only when `len` is zero.
#[no_mangle]
pub unsafe extern "C" fn sb_align_buffer(
    handle: *mut SbAlignerHandle,
    bytes: *const u8,
    len: usize,
    sample_rate: u32,
    text: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(handle) = handle.as_mut() else {
        set_last_error("handle is null");
        return std::ptr::null_mut();
    };
    let Some(text) = str_arg(text, "text") else {
        return std::ptr::null_mut();
    };
    let audio: &[u8] = if len == 0 {
        &[]
    } else if bytes.is_null() {
        set_last_error("bytes is null");
        return std::ptr::null_mut();
    } else {
        std::slice::from_raw_parts(bytes, len)
    };
    into_c_string(
        handle
            .session
            .get_word_timestamps_from_buffer(audio, sample_rate, text),
    )
}

#[no_mangle]
pub unsafe extern "C" fn sb_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Last error on this thread, or null. Valid until the next `sb_*` call.
#[no_mangle]
pub extern "C" fn sb_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(message) => message.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Crate version as a static string; do not free.
#[no_mangle]
pub extern "C" fn sb_version() -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(env!("CARGO_PKG_VERSION")).unwrap_or_default())
        .as_ptr()
}
