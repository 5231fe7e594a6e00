use rlawt::*;

trait FailToCompileIfNotSendSync
where
    Self: Send + Sync,
{
}
impl FailToCompileIfNotSendSync for Error {}
impl FailToCompileIfNotSendSync for ErrorKind {}
impl FailToCompileIfNotSendSync for Insets {}

// Context is deliberately absent here. It is confined to the thread that
// created it and implements neither Send nor Sync.
