//! The purpose of this library is to turn a drawable that an existing widget
//! toolkit owns into an OpenGL rendering target, without handing the toolkit
//! control over the GL side. The platform work of wiring a [`Context`] to a
//! native surface is done by the precompiled rlawt module, which this crate
//! locates, loads once per process, and talks to over a fixed entry-point
//! table.
//!
//! The native module ships next to the application as a per-platform
//! resource named `<os>-<arch>/<libname>`, for example
//! `macos-aarch64/librlawt.dylib`. [`load_natives`] resolves that resource,
//! stages it through a temporary copy, and loads it. Loading is implicit in
//! [`Context::new`]; call [`load_natives`] yourself only to surface a load
//! error early. Setting [`PATH_OVERRIDE_ENV`] loads an exact file instead,
//! which is how development builds of the module are tested.
//!
//! A [`Context`] is created for a widget that exposes both its native window
//! handle and its place in the toolkit's containment chain (the [`Widget`]
//! trait). After creation the context is configured and brought up in a
//! fixed order, then driven from the render loop:
//!
//! ```no_run
//! use raw_window_handle::{
//!     DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
//! };
//! use rlawt::{Context, Insets, Widget};
//!
//! struct Canvas {
//!     // Native window and position state of the embedding toolkit.
//! }
//!
//! impl Widget for Canvas {
//!     fn parent(&self) -> Option<&dyn Widget> {
//!         None
//!     }
//!
//!     fn position(&self) -> (i32, i32) {
//!         (0, 0)
//!     }
//!
//!     fn insets(&self) -> Option<Insets> {
//!         None
//!     }
//! }
//! # impl HasWindowHandle for Canvas {
//! #     fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
//! #         unimplemented!()
//! #     }
//! # }
//! # impl HasDisplayHandle for Canvas {
//! #     fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! fn init(canvas: &Canvas) -> rlawt::Result<Context> {
//!     let context = Context::new(canvas)?;
//!     context.configure_pixel_format(8, 24, 0)?;
//!     context.configure_multisamples(4)?;
//!     context.create_gl_context()?;
//!     context.set_swap_interval(1)?;
//!     Ok(context)
//! }
//! ```
//!
//! Rendering happens against the buffer named by
//! [`Context::framebuffer`], bound to the target returned by
//! [`Context::framebuffer_target`]. Both must be re-queried and re-bound
//! after every [`Context::swap_buffers`], because platforms that render
//! through framebuffer objects hand out a different buffer each frame.
//!
//! A [`Context`] is tied to the thread that uses it and is neither [`Send`]
//! nor [`Sync`]. Dropping it releases the native context; [`Context::destroy`]
//! does the same eagerly and is safe to call twice.

#![deny(missing_debug_implementations)]

mod context;
mod error;
mod ffi;
mod loader;
mod widget;

pub use crate::context::{Context, GL_COLOR_ATTACHMENT0, GL_FRONT};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::loader::{load_natives, PATH_OVERRIDE_ENV};
pub use crate::widget::{Insets, Widget};
