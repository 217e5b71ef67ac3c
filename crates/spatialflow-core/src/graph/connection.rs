//! Connection descriptors held by composite components.

use core::fmt;
use core::ops::{Range, RangeFull};

use super::port::{AudioPortId, ParameterPortId};

/// Selection of channels on one side of an audio connection.
///
/// `All` selects every channel of the port in ascending order and is resolved
/// against the port width when the graph is checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelList {
    /// Every channel of the port.
    #[default]
    All,
    /// Explicit channels, in connection order.
    Indices(Vec<usize>),
}

impl ChannelList {
    /// Every channel of the port.
    pub fn all() -> Self {
        ChannelList::All
    }

    /// A single channel.
    pub fn single(channel: usize) -> Self {
        ChannelList::Indices(vec![channel])
    }

    /// A contiguous range of channels.
    pub fn range(range: Range<usize>) -> Self {
        ChannelList::Indices(range.collect())
    }

    /// Resolves the selection against a port of `width` channels.
    pub fn resolve(&self, width: usize) -> Vec<usize> {
        match self {
            ChannelList::All => (0..width).collect(),
            ChannelList::Indices(indices) => indices.clone(),
        }
    }
}

impl fmt::Display for ChannelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelList::All => f.write_str("*"),
            ChannelList::Indices(indices) => {
                f.write_str("[")?;
                for (i, c) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<RangeFull> for ChannelList {
    fn from(_: RangeFull) -> Self {
        ChannelList::All
    }
}

impl From<Range<usize>> for ChannelList {
    fn from(range: Range<usize>) -> Self {
        ChannelList::range(range)
    }
}

impl From<usize> for ChannelList {
    fn from(channel: usize) -> Self {
        ChannelList::single(channel)
    }
}

impl From<Vec<usize>> for ChannelList {
    fn from(indices: Vec<usize>) -> Self {
        ChannelList::Indices(indices)
    }
}

impl From<&[usize]> for ChannelList {
    fn from(indices: &[usize]) -> Self {
        ChannelList::Indices(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for ChannelList {
    fn from(indices: [usize; N]) -> Self {
        ChannelList::Indices(indices.to_vec())
    }
}

/// Audio connection registered on a composite, resolved at setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioConnection {
    /// Sending port: an input of the composite or an output of a child.
    pub sender: AudioPortId,
    /// Sending channels.
    pub sender_channels: ChannelList,
    /// Receiving port: an output of the composite or an input of a child.
    pub receiver: AudioPortId,
    /// Receiving channels, paired with `sender_channels` by position.
    pub receiver_channels: ChannelList,
}

/// Parameter connection registered on a composite, resolved at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterConnection {
    /// Sending port.
    pub sender: ParameterPortId,
    /// Receiving port.
    pub receiver: ParameterPortId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(ChannelList::from(..), ChannelList::All);
        assert_eq!(ChannelList::from(1..4), ChannelList::Indices(vec![1, 2, 3]));
        assert_eq!(ChannelList::from(2), ChannelList::Indices(vec![2]));
        assert_eq!(ChannelList::from([3, 1]), ChannelList::Indices(vec![3, 1]));
        assert_eq!(ChannelList::from(&[0usize, 0][..]), ChannelList::Indices(vec![0, 0]));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(ChannelList::All.resolve(3), vec![0, 1, 2]);
        assert_eq!(ChannelList::from([5, 0]).resolve(3), vec![5, 0]);
        assert!(ChannelList::All.resolve(0).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ChannelList::All.to_string(), "*");
        assert_eq!(ChannelList::from([0, 2]).to_string(), "[0, 2]");
    }
}
