use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::env;

/// Where uploaded bytes end up.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Flat files under `storage_dir`, served under `/{mount_prefix}`.
    Local,
    /// Private objects in an S3 bucket, handed out as presigned URLs.
    S3,
}

/// Settings only the S3 backend needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub storage_dir: String,
    pub mount_prefix: String,
    /// Present iff `backend` is `S3`.
    pub s3: Option<S3Config>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Image upload service")]
pub struct Args {
    /// Host to bind to (overrides UPLOADER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOADER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend (overrides UPLOADER_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory where uploads are stored (overrides UPLOADER_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// URL prefix the storage directory is served under (overrides UPLOADER_MOUNT_PREFIX)
    #[arg(long)]
    pub mount_prefix: Option<String>,

    /// S3 bucket name (overrides AWS_S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// S3 region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name))
    }

    /// Merge CLI args over values from `lookup`, then apply defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };

        // --- Environment fallback ---
        let env_port = match var("UPLOADER_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOADER_PORT value `{}`", value))?,
            None => 8000,
        };
        let env_backend = match var("UPLOADER_BACKEND")? {
            Some(value) => BackendKind::from_str(&value, true)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing UPLOADER_BACKEND value `{}`", value))?,
            None => BackendKind::Local,
        };

        // --- Merge ---
        let backend = args.backend.unwrap_or(env_backend);
        let s3 = match backend {
            BackendKind::Local => None,
            BackendKind::S3 => {
                let Some(bucket) = args.bucket.or(var("AWS_S3_BUCKET")?) else {
                    bail!("AWS_S3_BUCKET environment variable is not set.");
                };
                Some(S3Config {
                    bucket,
                    region: args
                        .region
                        .or(var("AWS_REGION")?)
                        .unwrap_or_else(|| "ap-south-1".into()),
                    endpoint_url: args.endpoint_url.or(var("AWS_ENDPOINT_URL")?),
                })
            }
        };

        let raw_prefix = args
            .mount_prefix
            .or(var("UPLOADER_MOUNT_PREFIX")?)
            .unwrap_or_else(|| "uploadedfiles".into());
        let mount_prefix = raw_prefix.trim().trim_matches('/').to_string();
        if mount_prefix.is_empty() || mount_prefix.contains('/') {
            bail!(
                "mount prefix `{}` must be a single non-empty path segment",
                raw_prefix
            );
        }

        Ok(Self {
            host: args
                .host
                .or(var("UPLOADER_HOST")?)
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            backend,
            storage_dir: args
                .storage_dir
                .or(var("UPLOADER_STORAGE_DIR")?)
                .unwrap_or_else(|| "./uploadedfiles".into()),
            mount_prefix,
            s3,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_to_local_backend() {
        let cfg = AppConfig::resolve(Args::default(), env_of(&[])).unwrap();
        assert_eq!(cfg.backend, BackendKind::Local);
        assert_eq!(cfg.addr(), "0.0.0.0:8000");
        assert_eq!(cfg.storage_dir, "./uploadedfiles");
        assert_eq!(cfg.mount_prefix, "uploadedfiles");
        assert_eq!(cfg.s3, None);
    }

    #[test]
    fn cli_overrides_environment() {
        let args = Args {
            port: Some(9000),
            storage_dir: Some("/srv/images".into()),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            env_of(&[("UPLOADER_PORT", "7000"), ("UPLOADER_HOST", "127.0.0.1")]),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.storage_dir, "/srv/images");
    }

    #[test]
    fn s3_requires_a_bucket() {
        let err = AppConfig::resolve(Args::default(), env_of(&[("UPLOADER_BACKEND", "s3")]))
            .unwrap_err();
        assert!(err.to_string().contains("AWS_S3_BUCKET"));
    }

    #[test]
    fn s3_reads_bucket_and_region() {
        let cfg = AppConfig::resolve(
            Args::default(),
            env_of(&[("UPLOADER_BACKEND", "S3"), ("AWS_S3_BUCKET", "pics")]),
        )
        .unwrap();
        assert_eq!(
            cfg.s3,
            Some(S3Config {
                bucket: "pics".into(),
                region: "ap-south-1".into(),
                endpoint_url: None,
            })
        );
    }

    #[test]
    fn rejects_bad_port_and_backend() {
        assert!(AppConfig::resolve(Args::default(), env_of(&[("UPLOADER_PORT", "http")])).is_err());
        assert!(
            AppConfig::resolve(Args::default(), env_of(&[("UPLOADER_BACKEND", "ftp")])).is_err()
        );
    }

    #[test]
    fn mount_prefix_must_be_one_segment() {
        let with_prefix = |prefix: &str| Args {
            mount_prefix: Some(prefix.into()),
            ..Args::default()
        };

        for bad in ["/", "//", " / ", "a/b", "/static/images/"] {
            assert!(
                AppConfig::resolve(with_prefix(bad), env_of(&[])).is_err(),
                "{bad:?}"
            );
        }
        assert!(AppConfig::resolve(Args::default(), env_of(&[("UPLOADER_MOUNT_PREFIX", "/")])).is_err());

        let cfg = AppConfig::resolve(with_prefix("/images/"), env_of(&[])).unwrap();
        assert_eq!(cfg.mount_prefix, "images");
    }
}
