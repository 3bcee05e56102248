use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use axres::{ArscTable, AxmlDocument, Str};
use axres_zip::{FileCompressionType, ZipEntry, ZipError};

use crate::errors::ApkError;
use crate::models::{ApkJson, Receiver, Service};

const ANDROID_MANIFEST_PATH: &str = "AndroidManifest.xml";
const RESOURCE_TABLE_PATH: &str = "resources.arsc";

/// Main structure that represents an APK file.
pub struct Apk {
    zip: ZipEntry,
    axml: AxmlDocument,
    arsc: Option<ArscTable>,
}

/// Implementation of internal methods
impl Apk {
    fn init(p: &Path) -> Result<(ZipEntry, AxmlDocument, Option<ArscTable>), ApkError> {
        let file = File::open(p).map_err(ApkError::IoError)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);
        let mut input = Vec::new();
        reader.read_to_end(&mut input).map_err(ApkError::IoError)?;

        if input.is_empty() {
            return Err(ApkError::InvalidInput("got empty file"));
        }

        let zip = ZipEntry::new(input).map_err(ApkError::ZipError)?;

        let (manifest, _) = zip
            .read(ANDROID_MANIFEST_PATH)
            .map_err(|_| ApkError::InvalidInput("can't find AndroidManifest.xml, is it an apk?"))?;

        if manifest.is_empty() {
            return Err(ApkError::InvalidInput(
                "AndroidManifest.xml is empty, not a valid apk",
            ));
        }

        let arsc = match zip.read(RESOURCE_TABLE_PATH) {
            Ok((resource_data, _)) => {
                Some(ArscTable::parse(&mut &resource_data[..]).map_err(ApkError::ResourceError)?)
            }
            Err(_) => None,
        };

        let axml =
            AxmlDocument::parse(&mut &manifest[..]).map_err(ApkError::ManifestError)?;

        Ok((zip, axml, arsc))
    }

    /// Resolve raw attribute text (possibly a `@0x...` reference) against the
    /// bound resource table, falling back to the raw text when there is none
    /// or resolution fails.
    fn resolve(&self, raw: &str) -> String {
        match &self.arsc {
            Some(table) => Str::new(raw)
                .bind(table, None)
                .value()
                .unwrap_or_else(|_| raw.to_owned()),
            None => raw.to_owned(),
        }
    }
}

impl Apk {
    pub fn new(path: &Path) -> Result<Apk, ApkError> {
        if !path.exists() {
            return Err(ApkError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                "file not found",
            )));
        }

        let (zip, axml, arsc) = Self::init(path)?;

        Ok(Apk { zip, axml, arsc })
    }

    /// Read data from zip by filename
    #[inline]
    pub fn read(&self, filename: &str) -> Result<(Vec<u8>, FileCompressionType), ZipError> {
        self.zip.read(filename)
    }

    /// List of the filenames included in the central directory
    #[inline]
    pub fn namelist(&self) -> impl Iterator<Item = &String> {
        self.zip.namelist()
    }

    /// Returns the decoded `AndroidManifest.xml` as a textual XML byte stream.
    #[inline]
    pub fn get_xml_string(&self) -> &str {
        self.axml.get_xml_string()
    }

    /// Check if the APK has multiple dex files or not
    pub fn is_multidex(&self) -> bool {
        self.zip
            .namelist()
            .filter(|name| {
                if !name.starts_with("classes") || !name.ends_with(".dex") {
                    return false;
                }

                let middle = &name["classes".len()..name.len() - ".dex".len()];

                middle.is_empty() || middle.chars().all(|c| c.is_ascii_digit())
            })
            .count()
            > 1
    }

    #[inline]
    pub fn get_attribute_value(&self, tag: &str, name: &str) -> Option<String> {
        self.axml
            .get_attribute_value(tag, name)
            .map(|raw| self.resolve(raw))
    }

    #[inline]
    pub fn get_all_attribute_values<'a>(
        &'a self,
        tag: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        self.axml.get_all_attribute_values(tag, name)
    }

    /// Retrieves the package name defined in the `<manifest>` tag.
    ///
    /// See: <https://developer.android.com/guide/topics/manifest/manifest-element#package>
    #[inline]
    pub fn get_package_name(&self) -> Option<String> {
        self.get_attribute_value("manifest", "package")
    }

    /// Retrieves the `sharedUserId` defined in the `<manifest>` tag.
    #[inline]
    pub fn get_shared_user_id(&self) -> Option<String> {
        self.get_attribute_value("manifest", "sharedUserId")
    }

    /// Retrieves the `sharedUserLabel` defined in the `<manifest>` tag.
    #[inline]
    pub fn get_shared_user_label(&self) -> Option<String> {
        self.get_attribute_value("manifest", "sharedUserLabel")
    }

    /// Retrieves the `sharedUserMaxSdkVersion` defined in the `<manifest>` tag.
    #[inline]
    pub fn get_shared_user_max_sdk_version(&self) -> Option<String> {
        self.get_attribute_value("manifest", "sharedUserMaxSdkVersion")
    }

    /// Retrieves the application version code.
    #[inline]
    pub fn get_version_code(&self) -> Option<String> {
        self.get_attribute_value("manifest", "versionCode")
    }

    /// Retrieves the application version name.
    #[inline]
    pub fn get_version_name(&self) -> Option<String> {
        self.get_attribute_value("manifest", "versionName")
    }

    /// Retrieves the preferred installation location.
    #[inline]
    pub fn get_install_location(&self) -> Option<String> {
        self.get_attribute_value("manifest", "installLocation")
    }

    /// Extracts `<application android:allowTaskReparenting="true | false">`.
    #[inline]
    pub fn get_application_task_reparenting(&self) -> Option<String> {
        self.get_attribute_value("application", "allowTaskReparenting")
    }

    /// Extracts `<application android:allowBackup="true | false">`.
    #[inline]
    pub fn get_application_allow_backup(&self) -> Option<String> {
        self.get_attribute_value("application", "allowBackup")
    }

    /// Extracts the `android:appCategory` attribute from `<application>`.
    #[inline]
    pub fn get_application_category(&self) -> Option<String> {
        self.get_attribute_value("application", "appCategory")
    }

    /// Extracts the `android:backupAgent` attribute from `<application>`.
    #[inline]
    pub fn get_application_backup_agent(&self) -> Option<String> {
        self.get_attribute_value("application", "backupAgent")
    }

    /// Extracts the `android:debuggable` attribute from `<application>`.
    #[inline]
    pub fn get_application_debuggable(&self) -> Option<String> {
        self.get_attribute_value("application", "debuggable")
    }

    /// Extracts the `android:description` attribute from `<application>`.
    #[inline]
    pub fn get_application_description(&self) -> Option<String> {
        self.get_attribute_value("application", "description")
    }

    /// Extracts the `android:icon` attribute from `<application>`.
    #[inline]
    pub fn get_application_icon(&self) -> Option<String> {
        self.get_attribute_value("application", "icon")
    }

    /// Extracts the `android:label` attribute from `<application>`.
    #[inline]
    pub fn get_application_label(&self) -> Option<String> {
        self.get_attribute_value("application", "label")
    }

    /// Extracts the `android:name` attribute from `<application>`.
    #[inline]
    pub fn get_application_name(&self) -> Option<String> {
        self.get_attribute_value("application", "name")
    }

    /// Retrieves all declared permissions from `<uses-permission android:name="...">`.
    #[inline]
    pub fn get_permissions(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("uses-permission", "name")
    }

    /// Retrieves all declared permissions for API 23+ from `<uses-permission-sdk-23>`.
    #[inline]
    pub fn get_permissions_sdk23(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("uses-permission-sdk-23", "name")
    }

    /// Retrieves the minimum SDK version required by the app.
    #[inline]
    pub fn get_min_sdk_version(&self) -> Option<String> {
        self.get_attribute_value("uses-sdk", "minSdkVersion")
    }

    /// Retrieves the target SDK version requested by the app.
    #[inline]
    pub fn get_target_sdk_version(&self) -> Option<String> {
        self.get_attribute_value("uses-sdk", "targetSdkVersion")
    }

    /// Retrieves the maximum SDK version supported by the app.
    #[inline]
    pub fn get_max_sdk_version(&self) -> Option<String> {
        self.get_attribute_value("uses-sdk", "maxSdkVersion")
    }

    /// Retrieves all libraries declared by `<uses-library android:name="...">`.
    #[inline]
    pub fn get_libraries(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("uses-library", "name")
    }

    /// Retrieves all hardware or software features declared by `<uses-feature>`.
    #[inline]
    pub fn get_features(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("uses-feature", "name")
    }

    /// The app is designed to show its UI on a set of screens inside a vehicle.
    pub fn is_automotive(&self) -> bool {
        self.get_features()
            .any(|x| x == "android.hardware.type.automotive")
    }

    /// The app is designed to show its UI on a television.
    pub fn is_leanback(&self) -> bool {
        self.get_features()
            .any(|x| x == "android.hardware.type.television" || x == "android.software.leanback")
    }

    /// The app is designed to show its UI on a watch.
    pub fn is_wearable(&self) -> bool {
        self.get_features()
            .any(|x| x == "android.hardware.type.watch")
    }

    /// The app is designed to show its UI on Chromebooks.
    pub fn is_chromebook(&self) -> bool {
        self.get_features().any(|x| x == "android.hardware.type.pc")
    }

    /// Retrieves all declared permissions defined by `<permission android:name="...">`.
    #[inline]
    pub fn get_declared_permissions(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("permission", "name")
    }

    /// Get first found main activity (with intent filters `MAIN` + `LAUNCHER|INFO`)
    #[inline]
    pub fn get_main_activity(&self) -> Option<&str> {
        self.axml.get_main_activities().next()
    }

    /// Retrieves all main activities (with intent filters `MAIN` + `LAUNCHER|INFO`).
    #[inline]
    pub fn get_main_activities(&self) -> impl Iterator<Item = &str> {
        self.axml.get_main_activities()
    }

    /// Retrieves all activities declared in the manifest.
    #[inline]
    pub fn get_activities(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("activity", "name")
    }

    /// Retrieves all services declared in the manifest.
    pub fn get_services(&self) -> impl Iterator<Item = Service<'_>> {
        self.axml
            .root()
            .descendants()
            .filter(|el| el.name() == "service")
            .map(|el| Service {
                description: el.attr("description"),
                direct_boot_aware: el.attr("directBootAware"),
                enabled: el.attr("enabled"),
                exported: el.attr("exported"),
                foreground_service_type: el.attr("foregroundServiceType"),
                isolated_process: el.attr("isolatedProcess"),
                name: el.attr("name"),
                permission: el.attr("permission"),
                process: el.attr("process"),
                stop_with_task: el.attr("stopWithTask"),
            })
    }

    /// Retrieves all receivers declared in the manifest.
    pub fn get_receivers(&self) -> impl Iterator<Item = Receiver<'_>> {
        self.axml
            .root()
            .descendants()
            .filter(|el| el.name() == "receiver")
            .map(|el| Receiver {
                direct_boot_aware: el.attr("directBootAware"),
                enabled: el.attr("enabled"),
                exported: el.attr("exported"),
                icon: el.attr("icon"),
                label: el.attr("label"),
                name: el.attr("name"),
                permission: el.attr("permission"),
                process: el.attr("process"),
            })
    }

    /// Retrieves all providers declared in the manifest.
    #[inline]
    pub fn get_providers(&self) -> impl Iterator<Item = &str> {
        self.get_all_attribute_values("provider", "name")
    }

    /// Summarizes the manifest into the serializable [`ApkJson`] shape.
    pub fn to_json(&self) -> ApkJson {
        ApkJson {
            package_name: self.get_package_name(),
            min_sdk_version: self.get_min_sdk_version(),
            target_sdk_version: self.get_target_sdk_version(),
            max_sdk_version: self.get_max_sdk_version(),
            declared_permissions: self.get_declared_permissions().map(String::from).collect(),
            shared_user_id: self.get_shared_user_id(),
            shared_user_label: self.get_shared_user_label(),
            shared_user_max_sdk_version: self.get_shared_user_max_sdk_version(),
            version_code: self.get_version_code(),
            version_name: self.get_version_name(),
            install_location: self.get_install_location(),
            features: self.get_features().map(String::from).collect(),
            permissions: self.get_permissions().map(String::from).collect(),
            permissions_sdk23: self.get_permissions_sdk23().map(String::from).collect(),
        }
    }
}
