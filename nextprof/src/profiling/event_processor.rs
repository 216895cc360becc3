//! # Sample Processing
//!
//! Drives the pipeline over a sample stream:
//!
//! ```text
//! bytes ──PacketStream──▶ Packet ──ChainReconstructor──▶ CallChain ──Profile──▶ counts
//! ```
//!
//! A packet is only aggregated after it decoded completely. The first decode
//! error stops the stream but leaves everything aggregated before it in
//! place, so a truncated recording still yields a usable profile.

use log::{debug, info, warn};
use std::fs;
use std::path::Path;

use super::aggregator::Profile;
use super::chain::{ChainReconstructor, ChainStats};
use super::packet::{Packet, PacketStream, SamplePacket};
use crate::domain::{PacketError, ProfilerError};

/// Counters accumulated over everything a processor has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub packets_decoded: usize,
    pub samples_tracked: usize,
    /// Samples from threads other than the tracked one
    pub samples_ignored: usize,
    /// Tracked samples whose chain resolved to nothing
    pub empty_chains: usize,
    pub chain: ChainStats,
}

/// Encapsulates sample processing state
pub struct SampleProcessor<'a> {
    reconstructor: ChainReconstructor<'a>,
    pub stats: ProcessingStats,
}

impl<'a> SampleProcessor<'a> {
    #[must_use]
    pub fn new(reconstructor: ChainReconstructor<'a>) -> Self {
        if reconstructor.symbols().executable_ranges().is_empty() {
            warn!("No executable ranges configured: stack words will never be used as frames");
        }
        Self { reconstructor, stats: ProcessingStats::default() }
    }

    /// Process a single decoded packet
    pub fn process_packet(&mut self, profile: &mut Profile, packet: &Packet) {
        self.stats.packets_decoded += 1;
        match packet {
            Packet::Sample(sample) => self.handle_sample(profile, sample),
        }
    }

    fn handle_sample(&mut self, profile: &mut Profile, sample: &SamplePacket) {
        if !profile.observe_thread(sample.thread_id) {
            self.stats.samples_ignored += 1;
            return;
        }
        self.stats.samples_tracked += 1;

        let chain = self.reconstructor.reconstruct_counted(sample, &mut self.stats.chain);
        if chain.is_empty() {
            self.stats.empty_chains += 1;
            debug!("Sample at pc 0x{:08X} resolved to an empty chain", sample.pc);
            return;
        }
        profile.record_chain(&chain, self.reconstructor.symbols());
    }

    /// Process a concatenated packet stream starting at byte `offset`
    ///
    /// Returns the stream position after the last packet, i.e. `data.len()`
    /// when the whole stream decoded.
    ///
    /// # Errors
    /// Returns the first `PacketError`; packets before it remain aggregated.
    pub fn process_stream(
        &mut self,
        profile: &mut Profile,
        data: &[u8],
        offset: usize,
    ) -> Result<usize, PacketError> {
        let mut stream = PacketStream::with_offset(data, offset);
        for item in stream.by_ref() {
            let (_, packet) = item?;
            self.process_packet(profile, &packet);
        }
        Ok(stream.position())
    }

    /// Read a stream file and process it from byte `offset`
    ///
    /// # Errors
    /// Returns `ProfilerError::FileAccess` if the file cannot be read and
    /// `ProfilerError::Packet` on the first decode error.
    pub fn process_file<P: AsRef<Path>>(
        &mut self,
        profile: &mut Profile,
        path: P,
        offset: usize,
    ) -> Result<usize, ProfilerError> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|source| ProfilerError::FileAccess { path: path.to_path_buf(), source })?;

        let before = self.stats.packets_decoded;
        let result = self.process_stream(profile, &data, offset);
        let decoded = self.stats.packets_decoded - before;
        match &result {
            Ok(end) => info!("Processed {decoded} packets ({end} bytes) from {}", path.display()),
            Err(e) => warn!("Stopped {} after {decoded} packets: {e}", path.display()),
        }
        Ok(result?)
    }
}
