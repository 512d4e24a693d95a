//! Rendering collaborator interface
//!
//! The session never formats anything itself. Markdown, highlighting and
//! layout belong to whatever implements this trait.

pub trait Renderer {
    /// The transcript changed; redraw all of it.
    fn render(&mut self, transcript: &str);

    /// Nothing to show yet and no usable connection.
    fn render_connecting_state(&mut self);

    /// Connected with an empty transcript: show the idle prompt.
    fn render_ready_state(&mut self) {}

    /// Bring the newest content into view.
    fn scroll_to_bottom(&mut self);
}
