//! The toolkit side of the bridge.

/// Border insets of a top-level window: the thickness of the decorations
/// between the window's outer origin and its content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// One node of the toolkit's widget containment chain.
///
/// Implemented by the embedding toolkit so [`Context::new`](crate::Context::new)
/// can work out where a drawable sits inside its owning window before the
/// native layer has seen a single resize.
pub trait Widget {
    /// The widget containing this one, `None` at the root of the chain.
    fn parent(&self) -> Option<&dyn Widget>;

    /// Position of this widget's origin within its parent.
    fn position(&self) -> (i32, i32);

    /// Border insets when this widget is a top-level window, `None` for
    /// everything else.
    fn insets(&self) -> Option<Insets>;
}

/// Offset of `widget`'s origin from its owning window's content origin.
///
/// Ancestor positions accumulate from the drawable's parent upward. The walk
/// stops at the first top-level window, whose border insets are subtracted
/// because the native layer positions the surface relative to the content
/// area, not the decorated frame.
pub(crate) fn window_offset(widget: &dyn Widget) -> (i32, i32) {
    let (mut x, mut y) = (0, 0);

    let mut parent = widget.parent();
    while let Some(node) = parent {
        if let Some(insets) = node.insets() {
            x -= insets.left;
            y -= insets.top;
            break;
        }

        let (node_x, node_y) = node.position();
        x += node_x;
        y += node_y;
        parent = node.parent();
    }

    (x, y)
}
