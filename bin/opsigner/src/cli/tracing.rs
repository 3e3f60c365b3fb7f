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

use std::io;

pub use tracing::*;
use tracing::{subscriber, subscriber::Interest, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, FmtSubscriber, Layer};

use super::{LogFormat, LogsArgs};

/// Install the global subscriber. Keep the guard alive to flush buffered logs.
pub fn configure_logging(config: &LogsArgs) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = match &config.file {
        Some(log_file) => {
            tracing_appender::non_blocking(tracing_appender::rolling::never(".", log_file))
        }
        None => tracing_appender::non_blocking(io::stdout()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none());
    match config.format {
        LogFormat::Compact => {
            subscriber::set_global_default(builder.compact().finish().with(QuietTargetsLayer))?
        }
        LogFormat::Pretty => {
            subscriber::set_global_default(builder.pretty().finish().with(QuietTargetsLayer))?
        }
        LogFormat::Json => {
            subscriber::set_global_default(builder.json().finish().with(QuietTargetsLayer))?
        }
    }

    LogTracer::init()?;

    Ok(guard)
}

const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "alloy_transport_http"];

/// Drops events from chatty HTTP client internals.
struct QuietTargetsLayer;

impl<S: Subscriber> Layer<S> for QuietTargetsLayer {
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        if QUIET_TARGETS
            .iter()
            .any(|target| metadata.target().starts_with(target))
        {
            Interest::never()
        } else {
            Interest::always()
        }
    }
}
