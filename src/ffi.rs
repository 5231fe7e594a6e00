//! Raw entry points of the native rlawt module.
//!
//! The module exports a fixed C ABI. Every symbol is resolved eagerly when
//! the module is loaded, so a missing entry point surfaces as a load error
//! instead of a crash in the middle of rendering.

use std::ffi::{c_char, c_int, c_uint, c_void};

use libloading::Library;

use crate::error::{Error, ErrorKind, Result};

/// Operation completed.
pub(crate) const RLAWT_OK: c_int = 0;
/// Operation issued in the wrong lifecycle phase, like configuring the pixel
/// format after the GL context was created.
pub(crate) const RLAWT_ERR_STATE: c_int = 1;
/// Operation not available on the running platform.
pub(crate) const RLAWT_ERR_UNSUPPORTED: c_int = 2;

/// Opaque native-side state correlated with one [`Context`](crate::Context).
#[repr(C)]
pub(crate) struct RlawtContext {
    _opaque: [u8; 0],
}

pub(crate) type CreateContextFn =
    unsafe extern "C" fn(window: *mut c_void, display: *mut c_void) -> *mut RlawtContext;
pub(crate) type GetLastErrorFn = unsafe extern "C" fn(ctx: *mut RlawtContext) -> *const c_char;
pub(crate) type DestroyFn = unsafe extern "C" fn(ctx: *mut RlawtContext);
pub(crate) type ConfigureInsetsFn =
    unsafe extern "C" fn(ctx: *mut RlawtContext, x: c_int, y: c_int) -> c_int;
pub(crate) type ConfigurePixelFormatFn = unsafe extern "C" fn(
    ctx: *mut RlawtContext,
    alpha: c_int,
    depth: c_int,
    stencil: c_int,
) -> c_int;
pub(crate) type ConfigureMultisamplesFn =
    unsafe extern "C" fn(ctx: *mut RlawtContext, samples: c_int) -> c_int;
pub(crate) type CreateGLContextFn = unsafe extern "C" fn(ctx: *mut RlawtContext) -> c_int;
pub(crate) type GetFramebufferFn =
    unsafe extern "C" fn(ctx: *mut RlawtContext, front: c_int, name: *mut c_uint) -> c_int;
pub(crate) type SetSwapIntervalFn =
    unsafe extern "C" fn(ctx: *mut RlawtContext, interval: c_int, applied: *mut c_int) -> c_int;
pub(crate) type MakeCurrentFn = unsafe extern "C" fn(ctx: *mut RlawtContext) -> c_int;
pub(crate) type DetachCurrentFn = unsafe extern "C" fn(ctx: *mut RlawtContext) -> c_int;
pub(crate) type SwapBuffersFn = unsafe extern "C" fn(ctx: *mut RlawtContext) -> c_int;
pub(crate) type GetHandleFn =
    unsafe extern "C" fn(ctx: *mut RlawtContext, handle: *mut *mut c_void) -> c_int;

/// The resolved entry-point table of the loaded module.
///
/// Owning the [`Library`] keeps the module resident for as long as the table
/// lives. The table is only ever handed out as `&'static`, so the function
/// pointers never outlive it.
#[derive(Debug)]
pub(crate) struct Rlawt {
    pub create_context: CreateContextFn,
    pub get_last_error: GetLastErrorFn,
    pub destroy: DestroyFn,
    pub configure_insets: ConfigureInsetsFn,
    pub configure_pixel_format: ConfigurePixelFormatFn,
    pub configure_multisamples: ConfigureMultisamplesFn,
    pub create_gl_context: CreateGLContextFn,
    pub get_framebuffer: GetFramebufferFn,
    pub set_swap_interval: SetSwapIntervalFn,
    pub make_current: MakeCurrentFn,
    pub detach_current: DetachCurrentFn,
    pub swap_buffers: SwapBuffersFn,
    pub get_gl_context: GetHandleFn,
    pub get_cgl_share_group: GetHandleFn,
    pub get_glx_display: GetHandleFn,
    pub get_wgl_hdc: GetHandleFn,

    pub _lib: Library,
}

impl Rlawt {
    /// Resolve the full table out of `lib`, taking ownership of it.
    pub(crate) fn load_from(lib: Library) -> Result<Self> {
        let create_context = unsafe { symbol(&lib, b"rlawtCreateContext\0")? };
        let get_last_error = unsafe { symbol(&lib, b"rlawtGetLastError\0")? };
        let destroy = unsafe { symbol(&lib, b"rlawtDestroy\0")? };
        let configure_insets = unsafe { symbol(&lib, b"rlawtConfigureInsets\0")? };
        let configure_pixel_format = unsafe { symbol(&lib, b"rlawtConfigurePixelFormat\0")? };
        let configure_multisamples = unsafe { symbol(&lib, b"rlawtConfigureMultisamples\0")? };
        let create_gl_context = unsafe { symbol(&lib, b"rlawtCreateGLContext\0")? };
        let get_framebuffer = unsafe { symbol(&lib, b"rlawtGetFramebuffer\0")? };
        let set_swap_interval = unsafe { symbol(&lib, b"rlawtSetSwapInterval\0")? };
        let make_current = unsafe { symbol(&lib, b"rlawtMakeCurrent\0")? };
        let detach_current = unsafe { symbol(&lib, b"rlawtDetachCurrent\0")? };
        let swap_buffers = unsafe { symbol(&lib, b"rlawtSwapBuffers\0")? };
        let get_gl_context = unsafe { symbol(&lib, b"rlawtGetGLContext\0")? };
        let get_cgl_share_group = unsafe { symbol(&lib, b"rlawtGetCGLShareGroup\0")? };
        let get_glx_display = unsafe { symbol(&lib, b"rlawtGetGLXDisplay\0")? };
        let get_wgl_hdc = unsafe { symbol(&lib, b"rlawtGetWGLHDC\0")? };

        Ok(Rlawt {
            create_context,
            get_last_error,
            destroy,
            configure_insets,
            configure_pixel_format,
            configure_multisamples,
            create_gl_context,
            get_framebuffer,
            set_swap_interval,
            make_current,
            detach_current,
            swap_buffers,
            get_gl_context,
            get_cgl_share_group,
            get_glx_display,
            get_wgl_hdc,
            _lib: lib,
        })
    }
}

unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> Result<T> {
    match lib.get::<T>(name) {
        Ok(sym) => Ok(*sym),
        Err(err) => Err(Error::new(None, Some(err.to_string()), ErrorKind::NotFound)),
    }
}
