//! Package loading.
//!
//! A package is either an APK archive, a plain `AndroidManifest.xml` file, or a folder with an
//! `AndroidManifest.xml` (as decoded by apktool). Resource files referenced by the manifest are
//! looked up in the archive, or next to the manifest. The numeric references of compiled
//! manifests are mapped to files through `resources.arsc`.

use super::{
    backup_rules::{DataExtractionRules, FullBackupContent},
    manifest::{Manifest, ResourceRef, ResourceTable},
    network_security::NetworkSecurityConfig,
};
use crate::error::Kind;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};
use zip::ZipArchive;

const MANIFEST_NAME: &str = "AndroidManifest.xml";
const RESOURCE_TABLE_NAME: &str = "resources.arsc";
/// Local file header signature of zip archives.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Kind of analyzed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Apk,
    Manifest,
}

/// Loaded package: the manifest and the secondary documents it references.
#[derive(Debug)]
pub struct Package {
    file: PathBuf,
    kind: PackageKind,
    manifest: Manifest,
    network_security_config: Option<NetworkSecurityConfig>,
    full_backup_content: Option<FullBackupContent>,
    data_extraction_rules: Option<DataExtractionRules>,
}

impl Package {
    /// Loads the package at the given path.
    ///
    /// Only the manifest is mandatory. Referenced documents that cannot be found or parsed are
    /// skipped with a warning.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join(MANIFEST_NAME)
        } else {
            path.to_path_buf()
        };
        if !file.is_file() {
            return Err(Kind::ManifestNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let (kind, mut resources) = if is_archive(&file)? {
            debug!("loading {} as an APK archive", file.display());
            let archive = ZipArchive::new(File::open(&file)?)
                .with_context(|| format!("could not open the {} archive", file.display()))?;
            (PackageKind::Apk, Resources::Archive(archive))
        } else {
            debug!("loading {} as a plain manifest", file.display());
            let root = file.parent().map(Path::to_path_buf).unwrap_or_default();
            (PackageKind::Manifest, Resources::Directory(root))
        };

        let manifest_bytes = resources.read(MANIFEST_NAME).map_err(|e| {
            debug!("could not read the manifest: {:#}", e);
            Kind::ManifestNotFound {
                path: path.to_path_buf(),
            }
        })?;
        let mut manifest = Manifest::parse(&manifest_bytes)
            .with_context(|| format!("could not parse the manifest of {}", path.display()))?;
        if manifest.has_compiled_references() {
            if let Some(table) = resources.resource_table() {
                manifest.resolve_references(&table);
            }
        }

        let application = manifest.application();
        let network_security_config = resources.load(
            application.network_security_config.as_ref(),
            "network security configuration",
            NetworkSecurityConfig::parse,
        );
        let full_backup_content = resources.load(
            application.full_backup_content.as_ref(),
            "full backup content rules",
            FullBackupContent::parse,
        );
        let data_extraction_rules = resources.load(
            application.data_extraction_rules.as_ref(),
            "data extraction rules",
            DataExtractionRules::parse,
        );

        Ok(Self {
            file,
            kind,
            manifest,
            network_security_config,
            full_backup_content,
            data_extraction_rules,
        })
    }

    /// Creates a package from an already parsed manifest, without secondary documents.
    pub fn from_manifest<P: Into<PathBuf>>(file: P, manifest: Manifest) -> Self {
        Self {
            file: file.into(),
            kind: PackageKind::Manifest,
            manifest,
            network_security_config: None,
            full_backup_content: None,
            data_extraction_rules: None,
        }
    }

    pub fn with_network_security_config(mut self, config: NetworkSecurityConfig) -> Self {
        self.network_security_config = Some(config);
        self
    }

    pub fn with_full_backup_content(mut self, rules: FullBackupContent) -> Self {
        self.full_backup_content = Some(rules);
        self
    }

    pub fn with_data_extraction_rules(mut self, rules: DataExtractionRules) -> Self {
        self.data_extraction_rules = Some(rules);
        self
    }

    /// Analyzed file: the APK archive or the manifest.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn network_security_config(&self) -> Option<&NetworkSecurityConfig> {
        self.network_security_config.as_ref()
    }

    pub fn full_backup_content(&self) -> Option<&FullBackupContent> {
        self.full_backup_content.as_ref()
    }

    pub fn data_extraction_rules(&self) -> Option<&DataExtractionRules> {
        self.data_extraction_rules.as_ref()
    }
}

/// Checks the file signature, whatever its extension.
fn is_archive(file: &Path) -> Result<bool> {
    let mut magic = [0; 4];
    let mut f = File::open(file).with_context(|| format!("could not open {}", file.display()))?;
    let read = f.read(&mut magic)?;
    Ok(read == magic.len() && magic == ZIP_MAGIC)
}

/// Where the files of the package are read from.
enum Resources {
    Directory(PathBuf),
    Archive(ZipArchive<File>),
}

impl Resources {
    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        match self {
            Self::Directory(root) => {
                let path = root.join(name);
                fs::read(&path).with_context(|| format!("could not read {}", path.display()))
            }
            Self::Archive(archive) => {
                let mut entry = archive
                    .by_name(name)
                    .with_context(|| format!("{} not found in the archive", name))?;
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                let _ = entry.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }

    /// Loads the resource table. Any failure degrades to `None`.
    fn resource_table(&mut self) -> Option<ResourceTable> {
        let bytes = match self.read(RESOURCE_TABLE_NAME) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("compiled resource references will not be resolved: {:#}", e);
                return None;
            }
        };

        match ResourceTable::parse(&bytes) {
            Ok(table) => {
                debug!("{} entries loaded from the resource table", table.len());
                Some(table)
            }
            Err(e) => {
                warn!("could not parse the resource table: {:#}", e);
                None
            }
        }
    }

    /// Loads a document referenced by the manifest. Any failure degrades to `None`.
    fn load<T, F>(&mut self, reference: Option<&ResourceRef>, what: &str, parse: F) -> Option<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let reference = reference.filter(|r| r.is_reference())?;
        let Some(file) = reference.file() else {
            warn!(
                "the {} reference `{}` cannot be resolved to a file",
                what, reference
            );
            return None;
        };

        match self.read(file).and_then(|bytes| parse(&bytes)) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("could not load the {} from {}: {:#}", what, file, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Package, PackageKind};
    use crate::error::Kind;
    use std::{fs, io::Write};
    use zip::{write::FileOptions, ZipWriter};

    const MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
        package="com.example.app">
        <application android:networkSecurityConfig="@xml/network_security_config"
            android:fullBackupContent="@xml/backup_rules"
            android:dataExtractionRules="@xml/missing_rules"/>
    </manifest>"#;

    const NSC: &str = r#"<network-security-config>
        <base-config cleartextTrafficPermitted="false"/>
    </network-security-config>"#;

    const BACKUP_RULES: &str = r#"<full-backup-content>
        <exclude domain="sharedpref" path="secrets.xml"/>
    </full-backup-content>"#;

    #[test]
    fn it_loads_manifest_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AndroidManifest.xml"), MANIFEST).unwrap();
        fs::create_dir_all(dir.path().join("res/xml")).unwrap();
        fs::write(dir.path().join("res/xml/network_security_config.xml"), NSC).unwrap();
        fs::write(dir.path().join("res/xml/backup_rules.xml"), BACKUP_RULES).unwrap();

        let package = Package::load(dir.path()).unwrap();
        assert_eq!(package.kind(), PackageKind::Manifest);
        assert_eq!(package.file(), dir.path().join("AndroidManifest.xml"));
        assert_eq!(package.manifest().package(), "com.example.app");
        assert!(package.network_security_config().is_some());
        assert_eq!(package.full_backup_content().unwrap().rules.len(), 1);
        // Missing documents are skipped.
        assert!(package.data_extraction_rules().is_none());

        // Same result when pointing to the manifest itself.
        let package = Package::load(dir.path().join("AndroidManifest.xml")).unwrap();
        assert!(package.network_security_config().is_some());
    }

    #[test]
    fn it_loads_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.apk");
        let mut zip = ZipWriter::new(fs::File::create(&path).unwrap());
        zip.start_file("AndroidManifest.xml", FileOptions::default())
            .unwrap();
        zip.write_all(MANIFEST.as_bytes()).unwrap();
        zip.start_file("res/xml/network_security_config.xml", FileOptions::default())
            .unwrap();
        zip.write_all(b"<not-a-config/>").unwrap();
        let _ = zip.finish().unwrap();

        let package = Package::load(&path).unwrap();
        assert_eq!(package.kind(), PackageKind::Apk);
        assert_eq!(package.manifest().package(), "com.example.app");
        // Unparseable documents are skipped.
        assert!(package.network_security_config().is_none());
        assert!(package.full_backup_content().is_none());
    }

    #[test]
    fn it_reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let error = Package::load(dir.path()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Kind>(),
            Some(Kind::ManifestNotFound { .. })
        ));

        let path = dir.path().join("empty.apk");
        let mut zip = ZipWriter::new(fs::File::create(&path).unwrap());
        let _ = zip.finish().unwrap();
        // An empty archive has no local file header.
        assert!(Package::load(&path).is_err());
    }

    #[test]
    fn it_rejects_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AndroidManifest.xml"), "<application/>").unwrap();
        assert!(Package::load(dir.path()).is_err());
    }
}
