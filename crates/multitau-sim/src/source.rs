//! Frame sources.

use crate::error::{Error, Result};
use multitau_core::{ConfigurationError, Frame, FramePair};
use std::sync::Arc;

/// A lazy sequence of synchronized frame pairs, finite or infinite.
pub trait FrameSource: Iterator<Item = FramePair> {
    /// `(rows, cols)` of every frame produced.
    fn shape(&self) -> (usize, usize);
}

/// Creates fresh, independent sources.
///
/// A source cannot be rewound; restarting means asking the factory for a
/// new one. Sources created with the same seed produce identical pairs.
pub trait SourceFactory: Sync {
    type Source: FrameSource + Send;

    fn create(&self, seed: u64) -> Self::Source;

    /// `(rows, cols)` of the frames of every source.
    fn shape(&self) -> (usize, usize);

    /// Number of pairs per source, when finite.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// Source over pre-computed frame pairs.
#[derive(Debug, Clone)]
pub struct ArraySource {
    shape: (usize, usize),
    pairs: std::vec::IntoIter<FramePair>,
}

impl ArraySource {
    pub fn new(pairs: Vec<FramePair>) -> Result<Self> {
        let shape = check_shapes(&pairs)?;
        Ok(Self {
            shape,
            pairs: pairs.into_iter(),
        })
    }

    /// Pair up two channels of frames with their timestamps.
    pub fn from_channels(
        frames1: Vec<Frame>,
        frames2: Vec<Frame>,
        t1: &[i64],
        t2: &[i64],
    ) -> Result<Self> {
        if frames1.len() != frames2.len() || frames1.len() != t1.len() || t1.len() != t2.len() {
            return Err(Error::InvalidParameter(format!(
                "channel lengths differ: {} and {} frames, {} and {} times",
                frames1.len(),
                frames2.len(),
                t1.len(),
                t2.len()
            )));
        }
        let pairs = frames1
            .into_iter()
            .zip(frames2)
            .zip(t1.iter().zip(t2))
            .map(|((f1, f2), (&a, &b))| FramePair::new(f1, f2, a, b))
            .collect();
        Self::new(pairs)
    }
}

impl Iterator for ArraySource {
    type Item = FramePair;

    fn next(&mut self) -> Option<FramePair> {
        self.pairs.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pairs.size_hint()
    }
}

impl FrameSource for ArraySource {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }
}

/// Factory handing out [`ArraySource`]s over the same shared pairs.
/// The seed is ignored.
#[derive(Debug, Clone)]
pub struct ArrayFactory {
    shape: (usize, usize),
    pairs: Arc<Vec<FramePair>>,
}

impl ArrayFactory {
    pub fn new(pairs: Vec<FramePair>) -> Result<Self> {
        let shape = check_shapes(&pairs)?;
        Ok(Self {
            shape,
            pairs: Arc::new(pairs),
        })
    }
}

impl SourceFactory for ArrayFactory {
    type Source = ArraySource;

    fn create(&self, _seed: u64) -> ArraySource {
        ArraySource {
            shape: self.shape,
            pairs: self.pairs.to_vec().into_iter(),
        }
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.pairs.len())
    }
}

fn check_shapes(pairs: &[FramePair]) -> Result<(usize, usize)> {
    let first = pairs
        .first()
        .ok_or_else(|| Error::InvalidParameter("no frame pairs".to_string()))?;
    let shape = first.frame1.shape();
    for pair in pairs {
        for frame in [&pair.frame1, &pair.frame2] {
            if frame.shape() != shape {
                return Err(multitau_core::Error::from(ConfigurationError::ShapeMismatch {
                    expected: shape,
                    actual: frame.shape(),
                })
                .into());
            }
        }
    }
    Ok(shape)
}
