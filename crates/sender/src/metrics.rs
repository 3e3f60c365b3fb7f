// This file is part of Opsigner.
//
// Opsigner is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Opsigner is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Opsigner.
// If not, see https://www.gnu.org/licenses/.

use metrics::Counter;
use metrics_derive::Metrics;

#[derive(Metrics, Clone)]
#[metrics(scope = "sender")]
pub(crate) struct SenderMetrics {
    #[metric(describe = "the count of operations submitted.")]
    pub(crate) submitted: Counter,
    #[metric(describe = "the count of operations seen included.")]
    pub(crate) included: Counter,
    #[metric(describe = "the count of operations rejected on submission.")]
    pub(crate) rejected: Counter,
    #[metric(describe = "the count of inclusion waits that timed out.")]
    pub(crate) timed_out: Counter,
}

impl SenderMetrics {
    pub(crate) fn for_kind(kind: &'static str) -> Self {
        Self::new_with_labels(&[("kind", kind)])
    }
}
