use crate::SPSC::Structs::Message;

/// Receives every drained message, in order, synchronously.
///
/// The handler owns the interpretation of the payload: it looks at
/// `message.id` and reads `message.payload` with the matching accessor.
/// Any `FnMut(&Message)` is a handler.
pub trait Handler {
    /// False only for [`NoHandler`]. A consuming queue refuses to bind a
    /// handler type that reports itself absent.
    const PRESENT: bool = true;

    fn handle(&mut self, message: &Message);
}

impl<F> Handler for F
where
    F: FnMut(&Message),
{
    #[inline]
    fn handle(&mut self, message: &Message) {
        self(message)
    }
}

/// Handler type of a send-only queue. It can never be invoked: a send-only
/// queue refuses to drain before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl Handler for NoHandler {
    const PRESENT: bool = false;

    fn handle(&mut self, _message: &Message) {
        unreachable!("send-only queue has no handler")
    }
}
