//! The value returned by a successful `read`/`take`: either deserialized
//! application data (`ALIVE` changes) or `None` for dispose/unregister
//! changes, which carry metadata only.

use super::sample_info::SampleInfo;

#[derive(Clone, Debug)]
pub struct Sample<D> {
  pub data: Option<D>,
  pub info: SampleInfo,
}
