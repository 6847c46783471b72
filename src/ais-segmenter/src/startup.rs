use std::collections::HashMap;

use futures::StreamExt;
use segment_core::{Message, Segmenter, SegmenterConfig, SegmenterState, Ssvid};
use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, event, Level};

use crate::{
    error::{
        error::{
            EncodeStateSnafu, MalformedRecordSnafu, OpenFileSnafu, ParseStateSnafu, ReadInputSnafu,
            ReadStateSnafu, SegmentationSnafu, WriteOutputSnafu, WriteStateSnafu,
        },
        Result,
    },
    settings::Settings,
};

const MAX_LINE_LENGTH: usize = 1 << 20;

pub struct App {
    settings: Settings,
    config: SegmenterConfig,
    segmenters: HashMap<Ssvid, Segmenter>,
}

impl App {
    pub fn build(settings: Settings) -> App {
        let config = settings.segmenter_config();
        App {
            settings,
            config,
            segmenters: HashMap::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.config.validate().context(SegmentationSnafu)?;

        if let Some(path) = self.settings.load_state.clone() {
            self.load_state(&path).await?;
        }

        match (self.settings.infile.as_str(), self.settings.outfile.as_str()) {
            ("-", "-") => {
                let stdin = tokio::io::stdin();
                let stdout = tokio::io::stdout();
                self.run_streams(stdin, stdout).await?;
            }
            ("-", outfile) => {
                let stdin = tokio::io::stdin();
                let outfile = open_out(outfile).await?;
                self.run_streams(stdin, outfile).await?;
            }
            (infile, "-") => {
                let infile = open_in(infile).await?;
                let stdout = tokio::io::stdout();
                self.run_streams(infile, stdout).await?;
            }
            (infile, outfile) => {
                let infile = open_in(infile).await?;
                let outfile = open_out(outfile).await?;
                self.run_streams(infile, outfile).await?;
            }
        }

        match self.settings.save_state.clone() {
            Some(path) => self.save_state(&path).await?,
            None => {
                for segmenter in self.segmenters.values_mut() {
                    segmenter.flush();
                }
            }
        }

        Ok(())
    }

    /// Tag every input record with its segment id, preserving input order.
    /// A record the core cannot degrade gracefully, an unsorted timestamp
    /// or a malformed line is fatal.
    pub async fn run_streams(
        &mut self,
        input: impl AsyncRead + Unpin,
        output: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        let codec = LinesCodec::new_with_max_length(MAX_LINE_LENGTH);
        let mut lines = FramedRead::new(input, codec);
        let mut output = BufWriter::new(output);

        let mut line = 0u64;
        let mut num_messages = 0u64;
        while let Some(read) = lines.next().await {
            line += 1;
            let text = read.context(ReadInputSnafu)?;
            if text.trim().is_empty() {
                continue;
            }

            let msg: Message =
                serde_json::from_str(&text).context(MalformedRecordSnafu { line })?;
            if let Some(only) = self.settings.ssvid {
                if msg.ssvid != Ssvid(only) {
                    debug!(ssvid = %msg.ssvid, "skipping non-matching ssvid");
                    continue;
                }
            }

            let ssvid = msg.ssvid;
            if !self.segmenters.contains_key(&ssvid) {
                let segmenter =
                    Segmenter::new(ssvid, self.config.clone()).context(SegmentationSnafu)?;
                self.segmenters.insert(ssvid, segmenter);
            }
            let tagged = self
                .segmenters
                .get_mut(&ssvid)
                .unwrap()
                .process(msg)
                .context(SegmentationSnafu)?;

            let record = tagged
                .to_record(&self.config.segment_field)
                .context(SegmentationSnafu)?;
            output
                .write_all(record.to_string().as_bytes())
                .await
                .context(WriteOutputSnafu)?;
            output.write_all(b"\n").await.context(WriteOutputSnafu)?;
            num_messages += 1;
        }

        output.flush().await.context(WriteOutputSnafu)?;
        event!(
            Level::INFO,
            num_messages,
            num_vessels = self.segmenters.len(),
            "finished segmenting"
        );
        Ok(())
    }

    async fn load_state(&mut self, path: &std::path::Path) -> Result<()> {
        let path_str = path.display().to_string();
        let raw = tokio::fs::read_to_string(path)
            .await
            .context(ReadStateSnafu { path: &path_str })?;
        let states: Vec<SegmenterState> =
            serde_json::from_str(&raw).context(ParseStateSnafu { path: &path_str })?;

        for state in states {
            let ssvid = state.ssvid;
            let segmenter =
                Segmenter::restore(state, self.config.clone()).context(SegmentationSnafu)?;
            self.segmenters.insert(ssvid, segmenter);
        }
        event!(Level::INFO, path = %path_str, num_vessels = self.segmenters.len(), "resumed state");
        Ok(())
    }

    async fn save_state(&self, path: &std::path::Path) -> Result<()> {
        let path_str = path.display().to_string();
        let mut states: Vec<_> = self
            .segmenters
            .values()
            .map(Segmenter::snapshot)
            .collect();
        states.sort_by_key(|s| s.ssvid);

        let raw =
            serde_json::to_string(&states).context(EncodeStateSnafu { path: &path_str })?;
        tokio::fs::write(path, raw)
            .await
            .context(WriteStateSnafu { path: &path_str })?;
        event!(Level::INFO, path = %path_str, num_vessels = states.len(), "saved state");
        Ok(())
    }
}

async fn open_in(path: &str) -> Result<tokio::fs::File> {
    tokio::fs::File::open(path)
        .await
        .context(OpenFileSnafu { path })
}

async fn open_out(path: &str) -> Result<tokio::fs::File> {
    tokio::fs::File::create(path)
        .await
        .context(OpenFileSnafu { path })
}
