// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

//! Event-driven YAML output on top of the libyaml emitter.
//!
//! libyaml decides quoting, escaping and indentation; callers only pick a
//! preferred scalar style and whether collections are written in flow style.

use libyml as sys;
use libyml::success::Success;
use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::{ptr, slice};

use super::dumper::DumpOptions;
use super::errors::{Error, Result};

/// Preferred style of a scalar. libyaml falls back to a quoted style when the
/// text cannot be written the preferred way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarStyle {
    Any,
    Plain,
    SingleQuoted,
    Literal,
}

impl ScalarStyle {
    fn sys(self) -> sys::YamlScalarStyleT {
        match self {
            ScalarStyle::Any => sys::YamlScalarStyleT::YamlAnyScalarStyle,
            ScalarStyle::Plain => sys::YamlScalarStyleT::YamlPlainScalarStyle,
            ScalarStyle::SingleQuoted => sys::YamlScalarStyleT::YamlSingleQuotedScalarStyle,
            ScalarStyle::Literal => sys::YamlScalarStyleT::YamlLiteralScalarStyle,
        }
    }
}

/// A single YAML document being written into memory.
pub(crate) struct Writer {
    emitter: Box<MaybeUninit<sys::YamlEmitterT>>,
    // Written to by `write_to_vec` through a raw pointer held by the emitter.
    output: Box<Vec<u8>>,
    flow: bool,
}

impl Writer {
    /// Starts the stream and an implicit document.
    pub(crate) fn new(options: &DumpOptions) -> Result<Writer> {
        let mut emitter = Box::new(MaybeUninit::<sys::YamlEmitterT>::uninit());
        let mut output = Box::new(Vec::new());
        unsafe {
            let sys_emitter = emitter.as_mut_ptr();
            if sys::yaml_emitter_initialize(sys_emitter).fail {
                return Err(emit_error(sys_emitter));
            }
            sys::yaml_emitter_set_unicode(sys_emitter, options.allow_unicode);
            sys::yaml_emitter_set_width(sys_emitter, -1);
            let data: *mut Vec<u8> = &mut *output;
            sys::yaml_emitter_set_output(sys_emitter, write_to_vec, data.cast());
        }
        let mut writer = Writer {
            emitter,
            output,
            flow: options.flow_style,
        };
        writer.emit(|event| unsafe {
            sys::yaml_stream_start_event_initialize(event, sys::YamlEncodingT::YamlUtf8Encoding)
        })?;
        writer.emit(|event| unsafe {
            sys::document::yaml_document_start_event_initialize(
                event,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                true,
            )
        })?;
        Ok(writer)
    }

    pub(crate) fn scalar(&mut self, tag: Option<&str>, value: &str, style: ScalarStyle) -> Result<()> {
        let tag = c_tag(tag)?;
        let tag_ptr = tag.as_ref().map_or(ptr::null(), |t| t.as_ptr().cast::<u8>());
        let length = i32::try_from(value.len())
            .map_err(|_| Error::Emit("scalar is too long to emit".to_string()))?;
        let data = sys::api::ScalarEventData {
            anchor: ptr::null(),
            tag: tag_ptr,
            value: value.as_ptr(),
            length,
            plain_implicit: tag.is_none(),
            quoted_implicit: tag.is_none(),
            style: style.sys(),
            _marker: PhantomData,
        };
        self.emit(|event| unsafe { sys::yaml_scalar_event_initialize(event, data) })
    }

    pub(crate) fn begin_sequence(&mut self, tag: Option<&str>) -> Result<()> {
        let tag = c_tag(tag)?;
        let tag_ptr = tag.as_ref().map_or(ptr::null(), |t| t.as_ptr().cast::<u8>());
        let style = if self.flow {
            sys::YamlSequenceStyleT::YamlFlowSequenceStyle
        } else {
            sys::YamlSequenceStyleT::YamlAnySequenceStyle
        };
        self.emit(|event| unsafe {
            sys::yaml_sequence_start_event_initialize(event, ptr::null(), tag_ptr, tag_ptr.is_null(), style)
        })
    }

    pub(crate) fn end_sequence(&mut self) -> Result<()> {
        self.emit(|event| unsafe { sys::yaml_sequence_end_event_initialize(event) })
    }

    pub(crate) fn begin_mapping(&mut self, tag: Option<&str>) -> Result<()> {
        let tag = c_tag(tag)?;
        let tag_ptr = tag.as_ref().map_or(ptr::null(), |t| t.as_ptr().cast::<u8>());
        let style = if self.flow {
            sys::YamlMappingStyleT::YamlFlowMappingStyle
        } else {
            sys::YamlMappingStyleT::YamlAnyMappingStyle
        };
        self.emit(|event| unsafe {
            sys::yaml_mapping_start_event_initialize(event, ptr::null(), tag_ptr, tag_ptr.is_null(), style)
        })
    }

    pub(crate) fn end_mapping(&mut self) -> Result<()> {
        self.emit(|event| unsafe { sys::yaml_mapping_end_event_initialize(event) })
    }

    /// Closes the document and the stream and returns the text.
    pub(crate) fn finish(mut self) -> Result<String> {
        self.emit(|event| unsafe { sys::document::yaml_document_end_event_initialize(event, true) })?;
        self.emit(|event| unsafe { sys::yaml_stream_end_event_initialize(event) })?;
        unsafe {
            let sys_emitter = self.emitter.as_mut_ptr();
            if sys::yaml_emitter_flush(sys_emitter).fail {
                return Err(emit_error(sys_emitter));
            }
        }
        String::from_utf8(mem::take(&mut *self.output))
            .map_err(|e| Error::Emit(format!("emitter produced invalid UTF-8: {e}")))
    }

    fn emit(&mut self, initialize: impl FnOnce(*mut sys::YamlEventT) -> Success) -> Result<()> {
        let mut event = MaybeUninit::<sys::YamlEventT>::uninit();
        let sys_emitter = self.emitter.as_mut_ptr();
        if initialize(event.as_mut_ptr()).fail {
            return Err(Error::Emit("failed to build a YAML event".to_string()));
        }
        unsafe {
            if sys::yaml_emitter_emit(sys_emitter, event.as_mut_ptr()).fail {
                return Err(emit_error(sys_emitter));
            }
        }
        Ok(())
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        unsafe { sys::yaml_emitter_delete(self.emitter.as_mut_ptr()) }
    }
}

fn c_tag(tag: Option<&str>) -> Result<Option<CString>> {
    tag.map(|t| CString::new(t).map_err(|_| Error::Emit(format!("tag {t:?} contains a NUL byte"))))
        .transpose()
}

unsafe fn emit_error(emitter: *const sys::YamlEmitterT) -> Error {
    Error::Emit(unsafe { serde_yml::libyml::error::Error::emit_error(emitter) }.to_string())
}

unsafe fn write_to_vec(data: *mut c_void, buffer: *mut u8, size: u64) -> i32 {
    let output = unsafe { &mut *data.cast::<Vec<u8>>() };
    output.extend_from_slice(unsafe { slice::from_raw_parts(buffer, size as usize) });
    1
}
