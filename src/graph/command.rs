use rtrb::Consumer;

use super::node::{NodeId, NodeSpec};

/// Configuration change sent from the control thread to the render thread.
///
/// Commands are `Copy` so they travel through a lock-free ring without
/// allocation. Node ids are chosen on the control side, which lets both
/// copies of the graph stay in lockstep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphCommand {
    Create { id: NodeId, spec: NodeSpec },
    Connect { from: NodeId, to: NodeId, input: usize },
    /// Remove every outgoing connection of `from`.
    Disconnect { from: NodeId },
    Start { id: NodeId },
    Stop { id: NodeId },
    SetFrequency { id: NodeId, hz: f32 },
    SetGain { id: NodeId, amplitude: f32 },
    /// Drop the node and every connection touching it.
    Release { id: NodeId },
    Close,
}

pub trait CommandReceiver {
    fn pop(&mut self) -> Option<GraphCommand>;
}

impl CommandReceiver for Consumer<GraphCommand> {
    fn pop(&mut self) -> Option<GraphCommand> {
        Consumer::pop(self).ok()
    }
}
