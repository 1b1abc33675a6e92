/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use humanize_rs::bytes::Bytes;
use yaml_rust::{Yaml, yaml};

use g3_perf_data::{PerfDataConfig, SlotValueKind};

use super::PerfReporterConfig;

fn for_each_entry<F>(map: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    map.iter().try_for_each(|(k, v)| {
        let Yaml::String(key) = k else {
            return Err(anyhow!("perf reporter config keys must be strings, found {k:?}"));
        };
        f(key, v).context(format!("bad value for perf reporter key {key}"))
    })
}

fn normalize_key(k: &str) -> String {
    k.to_lowercase().replace('-', "_")
}

fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Integer(i) => Ok(i.to_string()),
        _ => Err(anyhow!("expected a string, found {v:?}")),
    }
}

fn secs_to_duration(secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("out of range seconds {secs}: {e}"))
}

/// Humanized durations like `500ms`, or plain seconds.
fn as_interval(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => {
                let secs = f64::from_str(s).map_err(|_| anyhow!("not a duration: {s}"))?;
                secs_to_duration(secs)
            }
            Err(e) => Err(anyhow!("not a duration: {s}: {e}")),
        },
        Yaml::Integer(i) => u64::try_from(*i)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("negative seconds {i}")),
        Yaml::Real(s) => {
            let secs = f64::from_str(s).map_err(|e| anyhow!("not a number: {s}: {e}"))?;
            secs_to_duration(secs)
        }
        _ => Err(anyhow!("expected a duration, found {v:?}")),
    }
}

/// Humanized sizes like `64KiB`, or plain bytes.
fn as_byte_size(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => s
            .parse::<Bytes>()
            .map(|b| b.size())
            .map_err(|e| anyhow!("not a byte size: {s}: {e}")),
        Yaml::Integer(i) => usize::try_from(*i).map_err(|_| anyhow!("negative byte size {i}")),
        _ => Err(anyhow!("expected a byte size, found {v:?}")),
    }
}

fn as_value_kind(v: &Yaml) -> anyhow::Result<SlotValueKind> {
    let s = as_string(v)?;
    match s.to_lowercase().as_str() {
        "long" | "integer" => Ok(SlotValueKind::Long),
        "double" | "float" => Ok(SlotValueKind::Double),
        _ => Err(anyhow!("unsupported value kind {s}")),
    }
}

fn valid_prefix(prefix: &str) -> bool {
    prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

impl PerfReporterConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = PerfReporterConfig::default();
            for_each_entry(map, |k, v| config.set_by_yaml_kv(k, v))?;
            Ok(config)
        } else {
            Err(anyhow!(
                "yaml value type for 'perf reporter config' should be 'map'"
            ))
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match normalize_key(k).as_str() {
            "prefix" => {
                let prefix = as_string(v).context(format!("invalid string value for key {k}"))?;
                if !valid_prefix(&prefix) {
                    return Err(anyhow!("invalid char found in prefix {prefix}"));
                }
                self.set_prefix(prefix);
            }
            "emit_interval" => {
                let interval = as_interval(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                if interval.is_zero() {
                    return Err(anyhow!("emit interval should not be zero"));
                }
                self.emit_interval = interval;
            }
            "value_kind" => {
                self.value_kind =
                    as_value_kind(v).context(format!("invalid value kind for key {k}"))?;
            }
            "perf_data" => {
                self.perf_data = parse_perf_data_yaml(v)
                    .context(format!("invalid perf data config value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}

fn parse_perf_data_yaml(v: &Yaml) -> anyhow::Result<PerfDataConfig> {
    match v {
        Yaml::Hash(map) => {
            let mut config = PerfDataConfig::default();
            for_each_entry(map, |k, v| match normalize_key(k).as_str() {
                "path" => {
                    let path = as_string(v).context(format!("invalid path value for key {k}"))?;
                    config.set_path(PathBuf::from(path));
                    Ok(())
                }
                "capacity" | "size" => {
                    let capacity = as_byte_size(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    config.set_capacity(capacity);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        }
        Yaml::String(path) => {
            let mut config = PerfDataConfig::default();
            config.set_path(PathBuf::from(path));
            Ok(config)
        }
        _ => Err(anyhow!("yaml value type for 'perf data' should be 'map' or 'string'")),
    }
}
