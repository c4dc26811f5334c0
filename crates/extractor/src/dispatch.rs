//! Archive codec dispatcher.

use crate::codec::{Codec, GenericCodec, SevenZipCodec, ZipCodec};
use crate::error::{ConfigError, ExtractError};
use crate::format::ArchiveFormat;
use crate::types::CodecKind;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// The codec capabilities handed to a [`Dispatcher`].
///
/// Slots left empty are reported by [`Dispatcher::new`].
#[derive(Clone, Default)]
pub struct CodecSet {
    slots: [Option<Arc<dyn Codec>>; 3],
}

impl CodecSet {
    /// An empty set; fill it with [`CodecSet::with`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// The codecs that ship with this crate.
    pub fn builtin() -> Self {
        Self::empty()
            .with(CodecKind::Zip, ZipCodec)
            .with(CodecKind::SevenZip, SevenZipCodec)
            .with(CodecKind::Generic, GenericCodec)
    }

    /// Register `codec` for `kind`, replacing any previous one.
    pub fn with(mut self, kind: CodecKind, codec: impl Codec + 'static) -> Self {
        self.slots[kind.index()] = Some(Arc::new(codec));
        self
    }

    /// Remove the codec registered for `kind`.
    pub fn without(mut self, kind: CodecKind) -> Self {
        self.slots[kind.index()] = None;
        self
    }
}

impl fmt::Debug for CodecSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<CodecKind> = CodecKind::ALL
            .into_iter()
            .filter(|k| self.slots[k.index()].is_some())
            .collect();
        f.debug_struct("CodecSet").field("present", &present).finish()
    }
}

/// Routes each archive to the codec for its format.
pub struct Dispatcher {
    codecs: [Arc<dyn Codec>; 3],
}

impl Dispatcher {
    /// Build a dispatcher; every codec slot must be filled.
    pub fn new(set: CodecSet) -> Result<Self, ConfigError> {
        let [zip, seven_zip, generic] = set.slots;
        let zip = zip.ok_or(ConfigError::MissingCodec(CodecKind::Zip))?;
        let seven_zip = seven_zip.ok_or(ConfigError::MissingCodec(CodecKind::SevenZip))?;
        let generic = generic.ok_or(ConfigError::MissingCodec(CodecKind::Generic))?;

        Ok(Self {
            codecs: [zip, seven_zip, generic],
        })
    }

    /// Decode `source` into the existing directory `dest`.
    pub fn dispatch(
        &self,
        format: ArchiveFormat,
        source: &Path,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        let kind = format.codec();
        debug!(archive = %source.display(), %format, codec = %kind, "Dispatching");
        self.codecs[kind.index()].extract(format, source, dest)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl Codec for Counting {
        fn extract(&self, _: ArchiveFormat, _: &Path, _: &Path) -> Result<(), ExtractError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_missing_codec_rejected() {
        for kind in CodecKind::ALL {
            let err = Dispatcher::new(CodecSet::builtin().without(kind)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingCodec(k) if k == kind));
        }
        assert!(Dispatcher::new(CodecSet::builtin()).is_ok());
    }

    #[test]
    fn test_dispatch_routes_by_format() {
        let zip_calls = Arc::new(AtomicUsize::new(0));
        let seven_calls = Arc::new(AtomicUsize::new(0));
        let generic_calls = Arc::new(AtomicUsize::new(0));

        let dispatcher = Dispatcher::new(
            CodecSet::empty()
                .with(CodecKind::Zip, Counting(zip_calls.clone()))
                .with(CodecKind::SevenZip, Counting(seven_calls.clone()))
                .with(CodecKind::Generic, Counting(generic_calls.clone())),
        )
        .unwrap();

        for format in ArchiveFormat::ALL {
            dispatcher
                .dispatch(format, Path::new("a"), Path::new("b"))
                .unwrap();
        }

        assert_eq!(zip_calls.load(Ordering::SeqCst), 1);
        assert_eq!(seven_calls.load(Ordering::SeqCst), 1);
        assert_eq!(generic_calls.load(Ordering::SeqCst), 4);
    }
}
