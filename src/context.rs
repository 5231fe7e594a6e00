//! The context bridge over the native rlawt module.

use std::ffi::{c_int, c_uint, c_void, CStr};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

use crate::error::{Error, ErrorKind, Result};
use crate::ffi;
use crate::loader;
use crate::widget::{self, Widget};

/// Framebuffer target for drawing straight to the front buffer.
pub const GL_FRONT: u32 = 0x0404;
/// Framebuffer target for drawing to the first color attachment of the
/// context's framebuffer object.
pub const GL_COLOR_ATTACHMENT0: u32 = 0x8CE0;

/// An OpenGL rendering target bound to one toolkit drawable.
///
/// The context goes through a fixed lifecycle: configuration, then
/// [`create_gl_context`](Self::create_gl_context), then rendering. The
/// native module rejects operations issued out of order with
/// [`ErrorKind::BadContextState`].
pub struct Context {
    raw: *mut ffi::RlawtContext,
    natives: &'static ffi::Rlawt,
    // A context stays on the thread that uses it.
    _nosendsync: PhantomData<*mut ()>,
}

impl Context {
    /// Creates a native context rendering into `widget`'s drawable.
    ///
    /// Loads the native module on first use. The drawable's initial offset
    /// inside its owning window is computed from the widget containment
    /// chain and handed to the native layer, which cannot see correct
    /// bounds before the first resize.
    pub fn new<W: Widget + HasWindowHandle + HasDisplayHandle>(widget: &W) -> Result<Self> {
        let natives = loader::natives()?;
        let (window, display) = native_handles(widget)?;

        let raw = unsafe { (natives.create_context)(window, display) };
        if raw.is_null() {
            return Err(Error::new(
                None,
                Some(String::from("the native module returned no context")),
                ErrorKind::InitializationFailed,
            ));
        }

        // From here on the native state is released by Drop, also when
        // configuring the insets fails below.
        let context = Context { raw, natives, _nosendsync: PhantomData };

        let (x, y) = widget::window_offset(widget);
        context.configure_insets(x, y)?;

        Ok(context)
    }

    /// Sets the drawable's offset from its owning window's content origin.
    fn configure_insets(&self, x: i32, y: i32) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.configure_insets)(raw, x, y) };
        self.check(raw, code)
    }

    /// Requests alpha, depth, and stencil bit depths for the pixel format.
    ///
    /// Valid only before [`create_gl_context`](Self::create_gl_context).
    pub fn configure_pixel_format(&self, alpha: u8, depth: u8, stencil: u8) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe {
            (self.natives.configure_pixel_format)(
                raw,
                alpha as c_int,
                depth as c_int,
                stencil as c_int,
            )
        };
        self.check(raw, code)
    }

    /// Requests a multisampled pixel format with `samples` samples per pixel.
    ///
    /// Valid only before [`create_gl_context`](Self::create_gl_context).
    pub fn configure_multisamples(&self, samples: u8) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.configure_multisamples)(raw, samples as c_int) };
        self.check(raw, code)
    }

    /// Creates the GL context with the configuration requested so far and
    /// makes it current on the calling thread.
    pub fn create_gl_context(&self) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.create_gl_context)(raw) };
        self.check(raw, code)
    }

    /// Name of the front or back framebuffer the context renders through.
    ///
    /// Zero names the window-system framebuffer. Non-zero names a
    /// framebuffer object, which the caller must bind itself after every
    /// [`swap_buffers`](Self::swap_buffers).
    pub fn framebuffer(&self, front: bool) -> Result<u32> {
        let raw = self.raw()?;
        let mut name: c_uint = 0;
        let code = unsafe { (self.natives.get_framebuffer)(raw, front as c_int, &mut name) };
        self.check(raw, code)?;
        Ok(name)
    }

    /// The color buffer to draw to for direct front-buffer rendering:
    /// [`GL_FRONT`] when the context renders through the window-system
    /// framebuffer, [`GL_COLOR_ATTACHMENT0`] when it renders through a
    /// framebuffer object.
    pub fn framebuffer_target(&self) -> Result<u32> {
        Ok(framebuffer_target_for(self.framebuffer(true)?))
    }

    /// Requests a buffer-swap interval and returns the interval actually
    /// applied.
    ///
    /// Returns `0` when the platform has no swap control. A negative
    /// (adaptive vsync) request comes back as the positive equivalent when
    /// only plain vsync is available.
    pub fn set_swap_interval(&self, interval: i32) -> Result<i32> {
        let raw = self.raw()?;
        let mut applied: c_int = 0;
        let code = unsafe { (self.natives.set_swap_interval)(raw, interval, &mut applied) };
        self.check(raw, code)?;
        Ok(applied)
    }

    /// Makes the GL context current on the calling thread.
    pub fn make_current(&self) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.make_current)(raw) };
        self.check(raw, code)
    }

    /// Detaches the GL context from the calling thread.
    pub fn detach_current(&self) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.detach_current)(raw) };
        self.check(raw, code)
    }

    /// Presents the finished frame.
    ///
    /// Any framebuffer binding is consumed by the presentation, so query
    /// [`framebuffer`](Self::framebuffer) and re-bind before drawing the
    /// next frame.
    pub fn swap_buffers(&self) -> Result<()> {
        let raw = self.raw()?;
        let code = unsafe { (self.natives.swap_buffers)(raw) };
        self.check(raw, code)
    }

    /// The native GL context handle: a `CGLContextObj`, `GLXContext`, or
    /// `HGLRC` depending on the platform.
    pub fn gl_context(&self) -> Result<*mut c_void> {
        self.platform_handle(self.natives.get_gl_context)
    }

    /// The `CGLShareGroupObj` of the context. Errors off macOS.
    pub fn cgl_share_group(&self) -> Result<*mut c_void> {
        self.platform_handle(self.natives.get_cgl_share_group)
    }

    /// The `Display` the context was created against. Errors off X11.
    pub fn glx_display(&self) -> Result<*mut c_void> {
        self.platform_handle(self.natives.get_glx_display)
    }

    /// The `HDC` the context draws to. Errors off Windows.
    pub fn wgl_hdc(&self) -> Result<*mut c_void> {
        self.platform_handle(self.natives.get_wgl_hdc)
    }

    fn platform_handle(&self, get: ffi::GetHandleFn) -> Result<*mut c_void> {
        let raw = self.raw()?;
        let mut handle = ptr::null_mut();
        let code = unsafe { get(raw, &mut handle) };
        self.check(raw, code)?;
        Ok(handle)
    }

    /// Releases the native context and everything it holds. Idempotent;
    /// also runs on drop.
    pub fn destroy(&mut self) {
        if self.raw.is_null() {
            return;
        }

        unsafe { (self.natives.destroy)(self.raw) };
        self.raw = ptr::null_mut();
    }

    fn raw(&self) -> Result<*mut ffi::RlawtContext> {
        if self.raw.is_null() {
            return Err(Error::new(
                None,
                Some(String::from("the context has been destroyed")),
                ErrorKind::BadContext,
            ));
        }

        Ok(self.raw)
    }

    fn check(&self, raw: *mut ffi::RlawtContext, code: c_int) -> Result<()> {
        if code == ffi::RLAWT_OK {
            return Ok(());
        }

        let message = unsafe {
            let msg = (self.natives.get_last_error)(raw);
            if msg.is_null() {
                None
            } else {
                Some(CStr::from_ptr(msg).to_string_lossy().into_owned())
            }
        };

        let kind = match code {
            ffi::RLAWT_ERR_STATE => ErrorKind::BadContextState,
            ffi::RLAWT_ERR_UNSUPPORTED => {
                ErrorKind::NotSupported("operation is not supported on this platform")
            },
            _ => ErrorKind::Misc,
        };

        Err(Error::new(Some(code as i64), message, kind))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("raw", &self.raw).finish()
    }
}

/// Maps the front framebuffer name onto the buffer to draw to.
fn framebuffer_target_for(front_name: u32) -> u32 {
    if front_name == 0 {
        GL_FRONT
    } else {
        GL_COLOR_ATTACHMENT0
    }
}

fn native_handles(
    widget: &(impl HasWindowHandle + HasDisplayHandle),
) -> Result<(*mut c_void, *mut c_void)> {
    let window = widget
        .window_handle()
        .map_err(|err| Error::new(None, Some(err.to_string()), ErrorKind::BadNativeWindow))?;

    match window.as_raw() {
        RawWindowHandle::AppKit(handle) => Ok((handle.ns_view.as_ptr(), ptr::null_mut())),
        RawWindowHandle::Win32(handle) => Ok((handle.hwnd.get() as *mut c_void, ptr::null_mut())),
        RawWindowHandle::Xlib(handle) => {
            let display = widget.display_handle().map_err(|err| {
                Error::new(None, Some(err.to_string()), ErrorKind::BadNativeWindow)
            })?;
            let display = match display.as_raw() {
                RawDisplayHandle::Xlib(display) => display
                    .display
                    .map_or(ptr::null_mut(), |display| display.as_ptr()),
                _ => ptr::null_mut(),
            };

            Ok((handle.window as *mut c_void, display))
        },
        _ => Err(ErrorKind::NotSupported("provided native window is not supported").into()),
    }
}
