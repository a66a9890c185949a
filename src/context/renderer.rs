use rtrb::Consumer;

use crate::{
    dsp::merge,
    graph::{AudioGraph, CommandReceiver, GraphCommand},
    MAX_BLOCK_SIZE,
};

/// The render-thread half of an [`AudioContext`](super::AudioContext).
///
/// Owns the render-side graph. Each call first drains every committed
/// command, then renders; configuration therefore takes effect at the start
/// of the next callback. Nothing here allocates or locks once the graph is
/// warm.
pub struct Renderer<R = Consumer<GraphCommand>> {
    graph: AudioGraph,
    commands: R,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl<R: CommandReceiver> Renderer<R> {
    pub fn new(sample_rate: f32, commands: R) -> Self {
        Self {
            graph: AudioGraph::for_rendering(sample_rate, MAX_BLOCK_SIZE),
            commands,
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn is_closed(&self) -> bool {
        self.graph.is_closed()
    }

    fn drain(&mut self) {
        while let Some(command) = self.commands.pop() {
            // Already validated against the control-side mirror.
            let _ = self.graph.apply(command);
        }
    }

    /// Render planar stereo of any length.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        self.drain();

        for (l, r) in left
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(right.chunks_mut(MAX_BLOCK_SIZE))
        {
            self.graph.render_block(l, r);
        }
    }

    /// Render into an interleaved device buffer with `channels` channels.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        self.drain();
        if channels == 0 {
            return;
        }

        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames_remaining = total_frames - frames_written;
            let frames_to_render = frames_remaining.min(MAX_BLOCK_SIZE);

            let left = &mut self.left[..frames_to_render];
            let right = &mut self.right[..frames_to_render];
            self.graph.render_block(left, right);

            let out_off = frames_written * channels;
            let out = &mut data[out_off..out_off + frames_to_render * channels];
            merge::interleave(left, right, out, channels);

            frames_written += frames_to_render;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AudioContext, AudioNode, ChannelMerger};

    #[test]
    fn interleaved_output_keeps_channels_apart() {
        let (mut ctx, mut renderer) = AudioContext::offline(48_000.0, 32);
        let left = ctx.create_oscillator(220.0).unwrap();
        let merger = ctx.create_channel_merger().unwrap();
        ctx.connect(&left, &merger, ChannelMerger::LEFT).unwrap();
        ctx.connect(&merger, &ctx.destination(), 0).unwrap();
        let _running = left.start(&mut ctx).unwrap();
        ctx.commit().unwrap();

        // Longer than one block to exercise the chunking loop.
        let frames = MAX_BLOCK_SIZE + 100;
        let mut data = vec![0.0f32; frames * 2];
        renderer.render_interleaved(&mut data, 2);

        let right_silent = data.chunks_exact(2).all(|frame| frame[1] == 0.0);
        let left_active = data.chunks_exact(2).any(|frame| frame[0].abs() > 0.5);
        assert!(right_silent);
        assert!(left_active);
        assert_eq!(renderer.graph().node_count(), ctx.graph().node_count());
        assert!(renderer.graph().node(merger.id()).is_some());
    }
}
