use std::path::PathBuf;

use crate::{
    capture::PageCapturer, llm::composer::PageComposer, processor::ReelProcessor,
    subtitle::SubtitleGenerator, tts::Narrator, video::VideoAssembler,
};

/// Typestate builder for [`ReelProcessor`]; each seam must be provided
/// before `build` becomes available.
pub struct ReelProcessorBuilder<C = (), N = (), P = (), V = ()> {
    output_dir: PathBuf,
    templates_dir: PathBuf,
    subtitles: SubtitleGenerator,
    composer: C,
    narrator: N,
    capturer: P,
    assembler: V,
}

impl ReelProcessorBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            templates_dir: PathBuf::from("templates"),
            subtitles: SubtitleGenerator::default(),
            composer: (),
            narrator: (),
            capturer: (),
            assembler: (),
        }
    }
}

impl<C, N, P, V> ReelProcessorBuilder<C, N, P, V> {
    pub fn templates_dir(mut self, templates_dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = templates_dir.into();
        self
    }

    pub fn subtitles(mut self, subtitles: SubtitleGenerator) -> Self {
        self.subtitles = subtitles;
        self
    }

    pub fn composer<C2: PageComposer + Send + Sync + 'static>(
        self,
        composer: C2,
    ) -> ReelProcessorBuilder<C2, N, P, V> {
        ReelProcessorBuilder {
            output_dir: self.output_dir,
            templates_dir: self.templates_dir,
            subtitles: self.subtitles,
            composer,
            narrator: self.narrator,
            capturer: self.capturer,
            assembler: self.assembler,
        }
    }

    pub fn narrator<N2: Narrator + Send + Sync + 'static>(
        self,
        narrator: N2,
    ) -> ReelProcessorBuilder<C, N2, P, V> {
        ReelProcessorBuilder {
            output_dir: self.output_dir,
            templates_dir: self.templates_dir,
            subtitles: self.subtitles,
            composer: self.composer,
            narrator,
            capturer: self.capturer,
            assembler: self.assembler,
        }
    }

    pub fn capturer<P2: PageCapturer + Send + Sync + 'static>(
        self,
        capturer: P2,
    ) -> ReelProcessorBuilder<C, N, P2, V> {
        ReelProcessorBuilder {
            output_dir: self.output_dir,
            templates_dir: self.templates_dir,
            subtitles: self.subtitles,
            composer: self.composer,
            narrator: self.narrator,
            capturer,
            assembler: self.assembler,
        }
    }

    pub fn assembler<V2: VideoAssembler + Send + Sync + 'static>(
        self,
        assembler: V2,
    ) -> ReelProcessorBuilder<C, N, P, V2> {
        ReelProcessorBuilder {
            output_dir: self.output_dir,
            templates_dir: self.templates_dir,
            subtitles: self.subtitles,
            composer: self.composer,
            narrator: self.narrator,
            capturer: self.capturer,
            assembler,
        }
    }
}

impl<C, N, P, V> ReelProcessorBuilder<C, N, P, V>
where
    C: PageComposer + Send + Sync + 'static,
    N: Narrator + Send + Sync + 'static,
    P: PageCapturer + Send + Sync + 'static,
    V: VideoAssembler + Send + Sync + 'static,
{
    pub fn build(self) -> ReelProcessor<C, N, P, V> {
        ReelProcessor {
            output_dir: self.output_dir,
            templates_dir: self.templates_dir,
            subtitles: self.subtitles,
            composer: self.composer,
            narrator: self.narrator,
            capturer: self.capturer,
            assembler: self.assembler,
        }
    }
}
