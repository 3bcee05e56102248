use std::fmt::{Display, Write};
use std::mem;

use bitflags::bitflags;
use log::{error, info, warn};
use winnow::binary::bits::bool;
use winnow::binary::{le_u32, u8};
use winnow::prelude::*;
use winnow::token::take;

bitflags! {
    /// Bitmask for configuration changes and qualifiers from Android's AConfiguration.
    ///
    /// [Source Code](https://cs.android.com/android/platform/superproject/main/+/main:frameworks/native/include/android/configuration.h;l=57;drc=61197364367c9e404c7da6900658f1b16c42d0da;bpv=0;bpt=1)
    #[derive(Debug)]
    pub(crate) struct ResTableConfigFlags: u32 {
        /// Bit mask for Mobile Country Code (MCC) configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#mcc>
        const CONFIG_MCC = 0x0001;

        /// Bit mask for Mobile Network Code (MNC) configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#mnc>
        const CONFIG_MNC = 0x0002;

        /// Bit mask for locale configuration (language and region).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#LocaleQualifier>
        const CONFIG_LOCALE = 0x0004;

        /// Bit mask for touchscreen configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#TouchscreenQualifier>
        const CONFIG_TOUCHSCREEN = 0x0008;

        /// Bit mask for keyboard type configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#ImeQualifier>
        const CONFIG_KEYBOARD = 0x0010;

        /// Bit mask for keyboard availability (hidden/shown).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#KeyboardAvailQualifier>
        const CONFIG_KEYBOARD_HIDDEN = 0x0020;

        /// Bit mask for navigation method configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#NavigationQualifier>
        const CONFIG_NAVIGATION = 0x0040;

        /// Bit mask for screen orientation configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#OrientationQualifier>
        const CONFIG_ORIENTATION = 0x0080;

        /// Bit mask for screen density configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#DensityQualifier>
        const CONFIG_DENSITY = 0x0100;

        /// Bit mask for screen size configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#ScreenSizeQualifier>
        const CONFIG_SCREEN_SIZE = 0x0200;

        /// Bit mask for smallest screen width configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#SmallestScreenWidthQualifier>
        const CONFIG_SMALLEST_SCREEN_SIZE = 0x2000;

        /// Bit mask for platform version configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#VersionQualifier>
        const CONFIG_VERSION = 0x0400;

        /// Bit mask for screen layout (long/short, size).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#ScreenAspectQualifier>
        const CONFIG_SCREEN_LAYOUT = 0x0800;

        /// Bit mask for UI mode (normal, car, desk, watch, etc.).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#UiModeQualifier>
        const CONFIG_UI_MODE = 0x1000;

        /// Bit mask for layout direction (LTR or RTL).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#LayoutDirectionQualifier>
        const CONFIG_LAYOUTDIR = 0x4000;

        /// Bit mask for screen roundness (round or not).
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#ScreenRoundQualifier>
        const CONFIG_SCREEN_ROUND = 0x8000;

        /// Bit mask for wide color gamut and HDR configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#WideColorGamutQualifier>
        const CONFIG_COLOR_MODE = 0x10000;

        /// Bit mask for grammatical gender configuration.
        /// See: <https://developer.android.com/guide/topics/resources/providing-resources#GrammaticalInflectionQualifier>
        const CONFIG_GRAMMATICAL_GENDER = 0x20000;

        /// Additional flag indicating an entry is public
        const SPEC_PUBLIC = 0x40000000;

        /// Additional flag indicating the resource id for this resource may change in a future build.
        /// If this flag is set, the SPEC_PUBLIC flag is also set since the resource must be
        /// public to be exposed as an API to other applications.
        const SPEC_STAGED_API = 0x20000000;
    }
}

/// Grammatical gender configuration flags, as used in Android's AConfiguration.
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub(crate) enum GrammaticalGender {
    /// Neuter grammatical gender.
    Neuter = 0b01,

    /// Feminine grammatical gender.
    Feminine = 0b10,

    /// Masculine grammatical gender.
    Masculine = 0b11,

    /// Grammatical gender not specified.
    Any,
}

impl From<u8> for GrammaticalGender {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b01 => Self::Neuter,
            0b10 => Self::Feminine,
            0b11 => Self::Masculine,
            _ => Self::Any,
        }
    }
}

impl Display for GrammaticalGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammaticalGender::Any => Ok(()),
            GrammaticalGender::Neuter => write!(f, "neuter"),
            GrammaticalGender::Feminine => write!(f, "feminine"),
            GrammaticalGender::Masculine => write!(f, "masculine"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum LayoutDir {
    /// Layout direction: value that corresponds to `ldltr`` resource qualifier specified
    /// See: <https://developer.android.com/guide/topics/resources/providing-resources.html#LayoutDirectionQualifier">
    Ltr = 0x01 << 6,

    /// Layout direction: value that corresponds to `ldrtl`` resource qualifier specified
    /// See: <https://developer.android.com/guide/topics/resources/providing-resources.html#LayoutDirectionQualifier">
    Rtl = 0x02 << 6,

    /// Layout direction not specified
    Any(u8),
}

impl From<u8> for LayoutDir {
    fn from(value: u8) -> Self {
        match value & 0xc0 {
            v if v == 0x01 << 6 => Self::Ltr,
            v if v == 0x02 << 6 => Self::Rtl,
            v => Self::Any(v),
        }
    }
}

impl Display for LayoutDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ltr => write!(f, "ldltr"),
            Self::Rtl => write!(f, "ldrtl"),
            Self::Any(v) => write!(f, "layoutDir={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum ScreenSize {
    Small = 0x01,
    Normal = 0x02,
    Large = 0x03,
    XLarge = 0x04,
    Any(u8),
}

impl From<u8> for ScreenSize {
    fn from(value: u8) -> Self {
        match value & 0x0f {
            0x01 => Self::Small,
            0x02 => Self::Normal,
            0x03 => Self::Large,
            0x04 => Self::XLarge,
            v => Self::Any(v),
        }
    }
}

impl Display for ScreenSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Normal => write!(f, "normal"),
            Self::Large => write!(f, "large"),
            Self::XLarge => write!(f, "xlarge"),
            Self::Any(v) => write!(f, "screenLayoutSize={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum ScreenLong {
    No = 0x1 << 4,
    Yes = 0x2 << 4,
    Any(u8),
}

impl From<u8> for ScreenLong {
    fn from(value: u8) -> Self {
        match value & 0x30 {
            v if v == 0x1 << 4 => Self::No,
            v if v == 0x2 << 4 => Self::Yes,
            v => Self::Any(v),
        }
    }
}

impl Display for ScreenLong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::No => write!(f, "notlong"),
            Self::Yes => write!(f, "long"),
            Self::Any(v) => write!(f, "screenLayoutLong={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum ScreenRound {
    No = 0x1,
    Yes = 0x2,
    Any(u8),
}

impl From<u8> for ScreenRound {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0x1 => Self::No,
            0x2 => Self::Yes,
            v => Self::Any(v),
        }
    }
}

impl Display for ScreenRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::No => write!(f, "notround"),
            Self::Yes => write!(f, "round"),
            Self::Any(v) => write!(f, "screenRound={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum WideColorGamut {
    No = 0x1,
    Yes = 0x2,
    Any(u8),
}

impl From<u8> for WideColorGamut {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0x1 => Self::No,
            0x2 => Self::Yes,
            v => Self::Any(v),
        }
    }
}

impl Display for WideColorGamut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::No => write!(f, "nowidecg"),
            Self::Yes => write!(f, "widecg"),
            Self::Any(v) => write!(f, "wideColorGamut={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum Hdr {
    No = 0x1 << 2,
    Yes = 0x2 << 2,
    Any(u8),
}

impl From<u8> for Hdr {
    fn from(value: u8) -> Self {
        match value & 0x0c {
            v if v == 0x1 << 2 => Self::No,
            v if v == 0x2 << 2 => Self::Yes,
            v => Self::Any(v),
        }
    }
}

impl Display for Hdr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::No => write!(f, "lowdr"),
            Self::Yes => write!(f, "highdr"),
            Self::Any(v) => write!(f, "hdr={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum Orientation {
    Any = 0x00,
    Port = 0x01,
    Land = 0x02,
    Square = 0x03,

    Unknown(u8),
}

impl From<u8> for Orientation {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Any,
            0x01 => Self::Port,
            0x02 => Self::Land,
            0x03 => Self::Square,
            v => Self::Unknown(v),
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::Port => write!(f, "port"),
            Self::Land => write!(f, "land"),
            Self::Square => write!(f, "square"),
            Self::Unknown(v) => write!(f, "orientation={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum UIModeType {
    Any = 0x00,
    Normal = 0x01,
    Desk = 0x02,
    Car = 0x03,
    Television = 0x04,
    Appliance = 0x05,
    Watch = 0x06,
    VRHeadset = 0x07,

    Unknown(u8),
}

impl From<u8> for UIModeType {
    fn from(value: u8) -> Self {
        match value & 0x0f {
            0x00 => Self::Any,
            0x01 => Self::Normal,
            0x02 => Self::Desk,
            0x03 => Self::Car,
            0x04 => Self::Television,
            0x05 => Self::Appliance,
            0x06 => Self::Watch,
            0x07 => Self::VRHeadset,
            v => Self::Unknown(v),
        }
    }
}

impl Display for UIModeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // original code don't handle Normal case, so as we
            Self::Any | Self::Normal => Ok(()),
            Self::Desk => write!(f, "desk"),
            Self::Car => write!(f, "car"),
            Self::Television => write!(f, "television"),
            Self::Appliance => write!(f, "appliance"),
            Self::Watch => write!(f, "watch"),
            Self::VRHeadset => write!(f, "vrheadset"),
            Self::Unknown(v) => write!(f, "uiModeType={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum UIModeNight {
    Any = 0x00 << 4,
    No = 0x01 << 4,
    Yes = 0x02 << 4,

    Unknown(u8),
}

impl From<u8> for UIModeNight {
    fn from(value: u8) -> Self {
        match value & 0x30 {
            v if v == 0x00 << 4 => Self::Any,
            v if v == 0x01 << 4 => Self::No,
            v if v == 0x02 << 4 => Self::Yes,
            v => Self::Unknown(v),
        }
    }
}

impl Display for UIModeNight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::No => f.write_str("notnight"),
            Self::Yes => f.write_str("night"),
            Self::Unknown(v) => write!(f, "uiModeNight={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u32)]
pub(crate) enum Density {
    Default = 0,
    Low = 120,
    Medium = 160,
    TV = 213,
    High = 240,
    XHigh = 320,
    XXHigh = 480,
    XXXHigh = 640,
    Any = 0xfffe,
    None = 0xffff,
    Unknown(u16),
}

impl From<u16> for Density {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Default,
            120 => Self::Low,
            160 => Self::Medium,
            213 => Self::TV,
            240 => Self::High,
            320 => Self::XHigh,
            480 => Self::XXHigh,
            640 => Self::XXXHigh,
            0xfffe => Self::Any,
            0xffff => Self::None,
            v => Self::Unknown(v),
        }
    }
}

impl Display for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => Ok(()),
            Self::Low => write!(f, "ldpi"),
            Self::Medium => write!(f, "mdpi"),
            Self::TV => write!(f, "tvdpi"),
            Self::High => write!(f, "hdpi"),
            Self::XHigh => write!(f, "xhdpi"),
            Self::XXHigh => write!(f, "xxhdpi"),
            Self::XXXHigh => write!(f, "xxxhdpi"),
            Self::Any => write!(f, "anydpi"),
            Self::None => write!(f, "nodpi"),
            Self::Unknown(v) => write!(f, "{}dpi", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum Touchscreen {
    Any = 0x00,
    NoTouch = 0x01,
    Stylus = 0x02,
    Finger = 0x03,
    Unknown(u8),
}

impl From<u8> for Touchscreen {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Any,
            0x01 => Self::NoTouch,
            0x02 => Self::Stylus,
            0x03 => Self::Finger,
            v => Self::Unknown(v),
        }
    }
}

impl Display for Touchscreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::NoTouch => write!(f, "notouch"),
            Self::Stylus => write!(f, "stylus"),
            Self::Finger => write!(f, "finger"),
            Self::Unknown(v) => write!(f, "touchscreen={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum KeysHidden {
    Any = 0x00,
    No = 0x01,
    Yes = 0x02,
    Soft = 0x03,
    Unknown(u8),
}

impl From<u8> for KeysHidden {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0x00 => Self::Any,
            0x01 => Self::No,
            0x02 => Self::Yes,
            0x03 => Self::Soft,
            v => Self::Unknown(v),
        }
    }
}

impl Display for KeysHidden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::No => write!(f, "keysexposed"),
            Self::Yes => write!(f, "keyshidden"),
            Self::Soft => write!(f, "keyssoft"),
            Self::Any | Self::Unknown(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum Keyboard {
    Any = 0x00,
    NoKeys = 0x01,
    Qwerty = 0x02,
    Key12 = 0x03,
    Unknown(u8),
}

impl From<u8> for Keyboard {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Any,
            0x01 => Self::NoKeys,
            0x02 => Self::Qwerty,
            0x03 => Self::Key12,
            v => Self::Unknown(v),
        }
    }
}

impl Display for Keyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::NoKeys => write!(f, "nokeys"),
            Self::Qwerty => write!(f, "qwerty"),
            Self::Key12 => write!(f, "12key"),
            Self::Unknown(v) => write!(f, "keyboard={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum NavHidden {
    Any = 0x00 << 2,
    No = 0x01 << 2,
    Yes = 0x02 << 2,
    Unknown(u8),
}

impl From<u8> for NavHidden {
    fn from(value: u8) -> Self {
        match value & 0x0c {
            v if v == 0x00 << 2 => Self::Any,
            v if v == 0x01 << 2 => Self::No,
            v if v == 0x02 << 2 => Self::Yes,
            v => Self::Unknown(v),
        }
    }
}

impl Display for NavHidden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::No => write!(f, "navexposed"),
            Self::Yes => write!(f, "navhidden"),
            Self::Unknown(v) => write!(f, "inputFlagsNavHidden={}", v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub(crate) enum Navigation {
    Any = 0x00,
    NoNav = 0x01,
    Dpad = 0x02,
    Trackball = 0x03,
    Wheel = 0x04,
    Unknown(u8),
}

impl From<u8> for Navigation {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Any,
            0x01 => Self::NoNav,
            0x02 => Self::Dpad,
            0x03 => Self::Trackball,
            0x04 => Self::Wheel,
            v => Self::Unknown(v),
        }
    }
}

impl Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::NoNav => write!(f, "nonav"),
            Self::Dpad => write!(f, "dpad"),
            Self::Trackball => write!(f, "trackball"),
            Self::Wheel => write!(f, "wheel"),
            Self::Unknown(v) => write!(f, "navigation={}", v),
        }
    }
}

/// Describes a particular resource configuration
///
/// [Source code](https://cs.android.com/android/platform/superproject/+/android-latest-release:frameworks/base/libs/androidfw/include/androidfw/ResourceTypes.h;l=967?q=ResTable_config&sq=&ss=android)
#[repr(C)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResTableConfig {
    /// Number of elements in this structure
    pub(crate) size: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         // Mobile country code (from SIM).  0 means "any".
    ///         uint16_t mcc;
    ///         // Mobile network code (from SIM).  0 means "any".
    ///         uint16_t mnc;
    ///     };
    ///     uint32_t imsi;
    /// };
    /// ```
    pub(crate) imsi: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         // This field can take three different forms:
    ///         // - \0\0 means "any".
    ///         //
    ///         // - Two 7 bit ascii values interpreted as ISO-639-1 language
    ///         //   codes ('fr', 'en' etc. etc.). The high bit for both bytes is
    ///         //   zero.
    ///         //
    ///         // - A single 16 bit little endian packed value representing an
    ///         //   ISO-639-2 3 letter language code. This will be of the form:
    ///         //
    ///         //   {1, t, t, t, t, t, s, s, s, s, s, f, f, f, f, f}
    ///         //
    ///         //   bit[0, 4] = first letter of the language code
    ///         //   bit[5, 9] = second letter of the language code
    ///         //   bit[10, 14] = third letter of the language code.
    ///         //   bit[15] = 1 always
    ///         //
    ///         // For backwards compatibility, languages that have unambiguous
    ///         // two letter codes are represented in that format.
    ///         //
    ///         // The layout is always bigendian irrespective of the runtime
    ///         // architecture.
    ///         char language[2];
    ///
    ///         // This field can take three different forms:
    ///         // - \0\0 means "any".
    ///         //
    ///         // - Two 7 bit ascii values interpreted as 2 letter region
    ///         //   codes ('US', 'GB' etc.). The high bit for both bytes is zero.
    ///         //
    ///         // - An UN M.49 3 digit region code. For simplicity, these are packed
    ///         //   in the same manner as the language codes, though we should need
    ///         //   only 10 bits to represent them, instead of the 15.
    ///         //
    ///         // The layout is always bigendian irrespective of the runtime
    ///         // architecture.
    ///         char country[2];
    ///     };
    ///     uint32_t locale;
    /// };
    /// ```
    pub(crate) locale: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         uint8_t orientation;
    ///         uint8_t touchscreen;
    ///         uint16_t density;
    ///     };
    ///     uint32_t screenType;
    /// };
    /// ```
    pub(crate) screen_type: u32,

    /// **cpp structure**
    /// ```
    /// struct {
    ///     union {
    ///         struct {
    ///             uint8_t keyboard;
    ///             uint8_t navigation;
    ///             uint8_t inputFlags;
    ///             uint8_t inputFieldPad0;
    ///         };
    ///         struct {
    ///             uint32_t input : 24;
    ///             uint32_t inputFullPad0 : 8;
    ///         };
    ///         struct {
    ///             uint8_t grammaticalInflectionPad0[3];
    ///             uint8_t grammaticalInflection;
    ///         };
    ///     };
    /// };
    /// ```
    pub(crate) generic_purpose_field: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         uint16_t screenWidth;
    ///         uint16_t screenHeight;
    ///     };
    ///     uint32_t screenSize;
    /// };
    /// ```
    pub(crate) screen_size: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         uint16_t sdkVersion;
    ///         // For now minorVersion must always be 0!!!  Its meaning
    ///         // is currently undefined.
    ///         uint16_t minorVersion;
    ///     };
    ///     uint32_t version;
    /// };
    /// ```
    pub(crate) version: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         uint8_t screenLayout;
    ///         uint8_t uiMode;
    ///         uint16_t smallestScreenWidthDp;
    ///     };
    ///     uint32_t screenConfig;
    /// };
    /// ```
    pub(crate) screen_config: u32,

    /// **cpp structure**
    /// ```
    /// union {
    ///     struct {
    ///         uint16_t screenWidthDp;
    ///         uint16_t screenHeightDp;
    ///     };
    ///     uint32_t screenSizeDp;
    /// };
    /// ```
    pub(crate) screen_size_dp: u32,

    /// The ISO-15924 short name for the script corresponding to this configuration
    ///
    /// Eg. Hant, Latn, etc.
    ///
    /// Interpreted in conjunction with the locale field
    pub(crate) locale_script: [u8; 4],

    /// A single BCP-47 variant subrtag.
    /// Will vary in length between 4 and 8 cahrs
    /// Interpreted in conjunction with the locale field
    pub(crate) locale_variant: [u8; 8],

    /// An extension of screenConfig.
    ///
    /// ```
    /// union {
    ///     struct {
    ///         uint8_t screenLayout2;      // Contains round/notround qualifier.
    ///         uint8_t colorMode;          // Wide-gamut, HDR, etc.
    ///         uint16_t screenConfigPad2;  // Reserved padding.
    ///     };
    ///     uint32_t screenConfig2;
    /// };
    /// ```
    pub(crate) screen_config_2: u32,

    /// If false and `locale_script` is set, it means that the script of the locale was explicitly provided
    ///
    /// If true, it means that `locale_script` was automatically computed
    pub(crate) locale_script_was_computed: bool,

    /// The value of BCP 47 Unicode extension for key `nu` (numbering system)
    /// Varies in length from 3 to 8 chars
    /// Zero filled value
    pub(crate) locale_numbering_system: [u8; 8],

    /// Mark all padding explicitly so it's clear how much we can expand it
    pub(crate) end_padding: [u8; 3],
}

impl ResTableConfig {
    #[inline(always)]
    pub(crate) fn parse(input: &mut &[u8]) -> ModalResult<ResTableConfig> {
        // to keep track of how many bytes was consumed
        let start = input.len();

        let size = le_u32.parse_next(input)?;

        let mut config = ResTableConfig {
            size,
            ..ResTableConfig::default()
        };

        (le_u32, le_u32, le_u32)
            .map(|(imsi, locale, screen_type)| {
                config.imsi = imsi;
                config.locale = locale;
                config.screen_type = screen_type;
            })
            .parse_next(input)?;

        if size >= 20 {
            config.generic_purpose_field = le_u32.parse_next(input)?;
        }
        if size >= 24 {
            config.screen_size = le_u32.parse_next(input)?;
        }
        if size >= 28 {
            config.version = le_u32.parse_next(input)?;
        }
        if size >= 32 {
            config.screen_config = le_u32.parse_next(input)?;
        }
        if size >= 36 {
            config.screen_size_dp = le_u32.parse_next(input)?;
        }
        if size >= 40 {
            config.locale_script = take(4usize)
                .parse_next(input)?
                .try_into()
                .expect("expected 4 bytes for locale_script");
        }
        if size >= 48 {
            config.locale_variant = take(8usize)
                .parse_next(input)?
                .try_into()
                .expect("expected 8 bytes for locale_variant");
        }
        if size >= 52 {
            config.screen_config_2 = le_u32.parse_next(input)?;
        }
        if size >= 53 {
            config.locale_script_was_computed = u8.parse_next(input)? != 0;
        }
        if size >= 61 {
            config.locale_numbering_system = take(8usize)
                .parse_next(input)?
                .try_into()
                .expect("expected 8 bytes for locale_numbering_system");
        }
        if size >= 64 {
            config.end_padding = take(3usize)
                .parse_next(input)?
                .try_into()
                .expect("expected 3 bytes for end padding");
        }
        if size > 64 {
            warn!("got unexpected ResTable_config structure, please open issue with this file");
        }

        // consume leftovers
        let _ =
            take(size.saturating_sub((start - input.len()) as u32) as usize).parse_next(input)?;

        Ok(config)
    }

    /// Convert [`ResTableConfig::imsi`] to union like field
    pub(crate) fn get_mcc_mnc(&self) -> (u16, u16) {
        let mcc = (self.imsi & 0x0000_FFFF) as u16;
        let mnc = ((self.imsi >> 16) & 0x0000_FFFF) as u16;
        (mcc, mnc)
    }

    /// Decode a 16-bit packed language or country code according to the C structure rules.
    fn decode_lang_or_country(&self, raw: u16) -> String {
        // Case 1: `\0\0` means "any"
        if raw == 0 {
            return "any".into();
        }

        let bytes = raw.to_be_bytes();

        // Case 2: Two 7-bit ASCII letters (ISO-639-1 or region code)
        // Both bytes must have the high bit (bit 7) set to 0.
        if bytes[0] & 0x80 == 0 && bytes[1] & 0x80 == 0 {
            return String::from_utf8_lossy(&bytes).to_string();
        }

        // Case 3: Packed 3-letter ISO-639-2 code.
        // The bit layout is:
        //
        //   {1, t, t, t, t, t, s, s, s, s, s, f, f, f, f, f}
        //
        //   bits[0..4]   = first letter ('a'..'z')
        //   bits[5..9]   = second letter
        //   bits[10..14] = third letter
        //   bit[15]      = always 1
        //
        if (raw & 0x8000) != 0 {
            let f = (raw & 0x1F) as u8; // first 5 bits
            let s = ((raw >> 5) & 0x1F) as u8; // next 5 bits
            let t = ((raw >> 10) & 0x1F) as u8; // next 5 bits

            let letters = [f + b'a', s + b'a', t + b'a'];
            return String::from_utf8_lossy(&letters).to_string();
        }

        // Fallback: unknown or malformed encoding
        format!("0x{:04x}", raw)
    }

    /// Convert [`ResTableConfig::locale`] to union like
    pub(crate) fn get_language_and_country(&self) -> (String, String) {
        // The structure is always big-endian regardless of platform architecture.
        let bytes = self.locale.to_be_bytes();

        let lang_raw = u16::from_be_bytes([bytes[0], bytes[1]]);
        let country_raw = u16::from_be_bytes([bytes[2], bytes[3]]);

        (
            self.decode_lang_or_country(lang_raw),
            self.decode_lang_or_country(country_raw),
        )
    }

    /// Convert [`ResTableConfig::screen_type`] to union like
    pub(crate) fn get_orientation_touchscreen_density(&self) -> (u8, u8, u16) {
        let orientation = (self.screen_type & 0x0000_00FF) as u8;
        let touchscreen = ((self.screen_type >> 8) & 0x0000_00FF) as u8;
        let density = ((self.screen_type >> 16) & 0x0000_FFFF) as u16;
        (orientation, touchscreen, density)
    }

    /// Extracts `keyboard`, `navigation`, and `inputFlags`
    pub(crate) fn get_keyboard_navigation_input_flags(&self) -> (u8, u8, u8) {
        let keyboard = (self.generic_purpose_field & 0x0000_00FF) as u8;
        let navigation = ((self.generic_purpose_field >> 8) & 0x0000_00FF) as u8;
        let input_flags = ((self.generic_purpose_field >> 16) & 0x0000_00FF) as u8;
        (keyboard, navigation, input_flags)
    }

    /// Extracts the 24-bit `input` value
    pub(crate) fn get_input(&self) -> u32 {
        self.generic_purpose_field & 0x00FF_FFFF
    }

    /// Extracts the 8-bit `grammaticalInflection`
    pub(crate) fn get_grammatical_inflection(&self) -> u8 {
        ((self.generic_purpose_field >> 24) & 0xFF) as u8
    }

    pub(crate) fn get_screen_width_height(&self) -> (u16, u16) {
        let screen_width = (self.screen_size & 0x0000_FFFF) as u16;
        let screen_height = ((self.screen_size >> 16) & 0x0000_FFFF) as u16;
        (screen_width, screen_height)
    }

    pub(crate) fn get_sdk_minor_version(&self) -> (u16, u16) {
        let sdk_version = (self.version & 0x0000_FFFF) as u16;
        let minor_version = ((self.version >> 16) & 0x0000_FFFF) as u16;
        (sdk_version, minor_version)
    }

    pub(crate) fn get_screen_layout_ui_smallest_width(&self) -> (u8, u8, u16) {
        let screen_layout = (self.screen_config & 0x0000_00FF) as u8;
        let ui_mode = ((self.screen_config >> 8) & 0x0000_00FF) as u8;
        let smallest_screen_width_dp = ((self.screen_config >> 16) & 0x0000_FFFF) as u16;
        (screen_layout, ui_mode, smallest_screen_width_dp)
    }

    pub(crate) fn get_screen_width_height_dp(&self) -> (u16, u16) {
        let screen_width_dp = (self.screen_size_dp & 0x0000_FFFF) as u16;
        let screen_height_dp = ((self.screen_size_dp >> 16) & 0x0000_FFFF) as u16;
        (screen_width_dp, screen_height_dp)
    }

    // TODO: add methods for locale_script and locale_variant

    pub(crate) fn get_screen_layout_2_color_mode(&self) -> (u8, u8) {
        let screen_layout2 = (self.screen_config_2 & 0x0000_00FF) as u8;
        let color_mode = ((self.screen_config_2 >> 8) & 0x0000_00FF) as u8;
        // NOTE: reserved padding, maybe sometimes in the future will be used
        // let screen_config_pad2 = ((self.screen_config_2 >> 16) & 0x0000_FFFF) as u16;

        (screen_layout2, color_mode)
    }

    /// Convert config to string
    ///
    /// [Source Code](https://cs.android.com/android/platform/superproject/main/+/main:frameworks/base/libs/androidfw/ResourceTypes.cpp;l=3368;drc=61197364367c9e404c7da6900658f1b16c42d0da;bpv=0;bpt=1?q=ResTable_config::toString)
    /// [App resource overview. Table 2](https://developer.android.com/guide/topics/resources/providing-resources#AlternativeResources)
    pub(crate) fn as_string(&self) -> String {
        // preallocate some buffer just in case, maybe bad idea
        let mut result = String::with_capacity(self.size as usize);

        let (mcc, mnc) = self.get_mcc_mnc();
        if mcc != 0 {
            let _ = write!(result, "mcc{}", mcc);
        }
        if mnc != 0 {
            if !result.is_empty() {
                result.push('-');
            }
            let _ = write!(result, "mnc{}", mnc);
        }

        // TODO: appendDirLocale

        let gender = GrammaticalGender::from(self.get_grammatical_inflection());
        if !matches!(gender, GrammaticalGender::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&gender.to_string());
        }

        let (screen_layout, ui_mode, smallest_screen_width_dp) =
            self.get_screen_layout_ui_smallest_width();

        let layout_dir = LayoutDir::from(screen_layout);
        if !matches!(layout_dir, LayoutDir::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&layout_dir.to_string());
        }

        if smallest_screen_width_dp != 0 {
            if !result.is_empty() {
                result.push('-');
            }

            let _ = write!(result, "sw{}dp", smallest_screen_width_dp);
        }

        let (screen_width_dp, screen_heigh_dp) = self.get_screen_width_height_dp();
        if screen_width_dp != 0 {
            if !result.is_empty() {
                result.push('-');
            }

            let _ = write!(result, "w{}dp", screen_width_dp);
        }
        if screen_heigh_dp != 0 {
            if !result.is_empty() {
                result.push('-');
            }

            let _ = write!(result, "h{}dp", screen_heigh_dp);
        }

        let screensize = ScreenSize::from(screen_layout);
        if !matches!(screensize, ScreenSize::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&screensize.to_string());
        }

        let screenlong = ScreenLong::from(screen_layout);
        if !matches!(screenlong, ScreenLong::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&screenlong.to_string());
        }

        let screenround = ScreenRound::from(screen_layout);
        if !matches!(screenround, ScreenRound::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&screenround.to_string());
        }

        let (_, color_mode) = self.get_screen_layout_2_color_mode();
        let wide_color_gamut = WideColorGamut::from(color_mode);
        if !matches!(wide_color_gamut, WideColorGamut::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&wide_color_gamut.to_string());
        }

        let hdr = Hdr::from(color_mode);
        if !matches!(hdr, Hdr::Any(_)) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&hdr.to_string());
        }

        let (orientation, touchscreen, density) = self.get_orientation_touchscreen_density();
        let orientation = Orientation::from(orientation);
        if !matches!(orientation, Orientation::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&orientation.to_string());
        }

        let ui_mode_type = UIModeType::from(ui_mode);
        if !matches!(ui_mode_type, UIModeType::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&ui_mode_type.to_string());
        }

        let ui_mode_night = UIModeNight::from(ui_mode);
        if !matches!(ui_mode_night, UIModeNight::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&ui_mode_night.to_string());
        }

        let density = Density::from(density);
        if !matches!(density, Density::Default) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&density.to_string());
        }

        let touchscreen = Touchscreen::from(touchscreen);
        if !matches!(touchscreen, Touchscreen::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&touchscreen.to_string());
        }

        let (keyboard, navigation, input_flags) = self.get_keyboard_navigation_input_flags();

        let keyshidden = KeysHidden::from(input_flags);
        if !matches!(keyshidden, KeysHidden::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&keyshidden.to_string());
        }

        let keyboard = Keyboard::from(keyboard);
        if !matches!(keyboard, Keyboard::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&keyboard.to_string());
        }

        let navhidden = NavHidden::from(input_flags);
        if !matches!(navhidden, NavHidden::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&navhidden.to_string());
        }

        let navigation = Navigation::from(navigation);
        if !matches!(navigation, Navigation::Any) {
            if !result.is_empty() {
                result.push('-');
            }
            result.push_str(&navigation.to_string());
        }

        if self.screen_size != 0 {
            if !result.is_empty() {
                result.push('-');
            }
            let (screen_width, screen_height) = self.get_screen_width_height();

            let _ = write!(result, "{}x{}", screen_width, screen_height);
        }

        if self.version != 0 {
            if !result.is_empty() {
                result.push('-');
            }

            let (sdk_version, minor_version) = self.get_sdk_minor_version();
            let _ = write!(result, "v{}", sdk_version);
            if minor_version != 0 {
                let _ = write!(result, ".{}", minor_version);
            }
        }

        result
    }
}

/// Builder-style construction of a *requested* configuration — the device
/// qualifiers a caller passes to [`crate::ArscTable::get_resource`]. The
/// on-disk layout only ever comes from [`ResTableConfig::parse`]; this is
/// the other direction, assembling one from scratch.
impl ResTableConfig {
    pub fn new() -> ResTableConfig {
        ResTableConfig::default()
    }

    fn pack_lang_or_country(code: &str) -> u16 {
        let bytes = code.as_bytes();
        if bytes.len() != 2 {
            return 0;
        }
        u16::from_be_bytes([bytes[0], bytes[1]])
    }

    /// Set the BCP-47-ish two-letter language/country pair (e.g. `"en"`, `"US"`).
    /// Pass `""` for either to leave that sub-field unset ("any").
    pub fn with_locale(mut self, language: &str, country: &str) -> ResTableConfig {
        let lang = Self::pack_lang_or_country(language);
        let country = Self::pack_lang_or_country(country);
        self.locale = (lang as u32) | ((country as u32) << 16);
        self
    }

    pub fn with_mcc_mnc(mut self, mcc: u16, mnc: u16) -> ResTableConfig {
        self.imsi = (mcc as u32) | ((mnc as u32) << 16);
        self
    }

    pub fn with_density(mut self, density: u16) -> ResTableConfig {
        let (orientation, touchscreen, _) = self.get_orientation_touchscreen_density();
        self.screen_type =
            (orientation as u32) | ((touchscreen as u32) << 8) | ((density as u32) << 16);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> ResTableConfig {
        let (_, touchscreen, density) = self.get_orientation_touchscreen_density();
        self.screen_type =
            (orientation as u32) | ((touchscreen as u32) << 8) | ((density as u32) << 16);
        self
    }

    pub fn with_sdk_version(mut self, sdk_version: u16) -> ResTableConfig {
        let (_, minor_version) = self.get_sdk_minor_version();
        self.version = (sdk_version as u32) | ((minor_version as u32) << 16);
        self
    }

    pub fn with_screen_width_height(mut self, width: u16, height: u16) -> ResTableConfig {
        self.screen_size = (width as u32) | ((height as u32) << 16);
        self
    }

    pub fn with_screen_width_height_dp(mut self, width_dp: u16, height_dp: u16) -> ResTableConfig {
        self.screen_size_dp = (width_dp as u32) | ((height_dp as u32) << 16);
        self
    }

    pub fn with_smallest_screen_width_dp(mut self, dp: u16) -> ResTableConfig {
        let (screen_layout, ui_mode, _) = self.get_screen_layout_ui_smallest_width();
        self.screen_config =
            (screen_layout as u32) | ((ui_mode as u32) << 8) | ((dp as u32) << 16);
        self
    }

    #[inline]
    fn screen_size_axis(screen_layout: u8) -> u8 {
        screen_layout & 0x0F
    }

    #[inline]
    fn screen_long_axis(screen_layout: u8) -> u8 {
        (screen_layout >> 4) & 0x03
    }

    #[inline]
    fn layout_dir_axis(screen_layout: u8) -> u8 {
        (screen_layout >> 6) & 0x03
    }

    #[inline]
    fn ui_type_axis(ui_mode: u8) -> u8 {
        ui_mode & 0x0F
    }

    #[inline]
    fn ui_night_axis(ui_mode: u8) -> u8 {
        (ui_mode >> 4) & 0x03
    }

    #[inline]
    fn keys_hidden_axis(input_flags: u8) -> u8 {
        input_flags & 0x03
    }

    #[inline]
    fn nav_hidden_axis(input_flags: u8) -> u8 {
        (input_flags >> 2) & 0x03
    }
}

/// Axis-by-axis configuration matching (§4.4). `None` stands for a nil
/// (unconstrained) configuration on either side of these predicates.
impl ResTableConfig {
    /// Is `self` a candidate resource variant for `settings`?
    pub fn matches(&self, settings: Option<&ResTableConfig>) -> bool {
        let Some(settings) = settings else {
            // nil settings matches everything
            return true;
        };

        let (mcc, mnc) = self.get_mcc_mnc();
        let (settings_mcc, settings_mnc) = settings.get_mcc_mnc();
        if mcc != 0 {
            if settings_mcc == 0 {
                return false;
            }
            if mcc != settings_mcc {
                return false;
            }
        }
        if mnc != 0 && mnc != settings_mnc {
            return false;
        }

        let (language, country) = self.get_language_and_country();
        let (settings_language, settings_country) = settings.get_language_and_country();
        let language_set = language != "any";
        if language_set {
            // A language-qualified resource never matches a language-unspecified request.
            if settings_language == "any" {
                return false;
            }
            if language != settings_language {
                return false;
            }
            if country != "any" && country != settings_country {
                return false;
            }
        }

        let (orientation, touchscreen, _) = self.get_orientation_touchscreen_density();
        let (settings_orientation, settings_touchscreen, _) =
            settings.get_orientation_touchscreen_density();
        if orientation != 0 && orientation != settings_orientation {
            return false;
        }
        if touchscreen != 0 && touchscreen != settings_touchscreen {
            return false;
        }

        let (keyboard, navigation, input_flags) = self.get_keyboard_navigation_input_flags();
        let (settings_keyboard, settings_navigation, settings_input_flags) =
            settings.get_keyboard_navigation_input_flags();
        if keyboard != 0 && keyboard != settings_keyboard {
            return false;
        }
        if navigation != 0 && navigation != settings_navigation {
            return false;
        }
        let keys_hidden = Self::keys_hidden_axis(input_flags);
        let settings_keys_hidden = Self::keys_hidden_axis(settings_input_flags);
        if keys_hidden != 0 && keys_hidden != settings_keys_hidden {
            return false;
        }
        let nav_hidden = Self::nav_hidden_axis(input_flags);
        let settings_nav_hidden = Self::nav_hidden_axis(settings_input_flags);
        if nav_hidden != 0 && nav_hidden != settings_nav_hidden {
            return false;
        }

        let (screen_width, screen_height) = self.get_screen_width_height();
        let (settings_width, settings_height) = settings.get_screen_width_height();
        if screen_width != 0 && settings_width != 0 && screen_width > settings_width {
            return false;
        }
        if screen_height != 0 && settings_height != 0 && screen_height > settings_height {
            return false;
        }

        let (screen_layout, ui_mode, smallest_width_dp) =
            self.get_screen_layout_ui_smallest_width();
        let (settings_layout, settings_ui_mode, settings_smallest_width_dp) =
            settings.get_screen_layout_ui_smallest_width();
        if smallest_width_dp != 0
            && settings_smallest_width_dp != 0
            && smallest_width_dp > settings_smallest_width_dp
        {
            return false;
        }

        let screen_size = Self::screen_size_axis(screen_layout);
        let settings_screen_size = Self::screen_size_axis(settings_layout);
        if screen_size != 0 && settings_screen_size != 0 && screen_size > settings_screen_size {
            return false;
        }
        let screen_long = Self::screen_long_axis(screen_layout);
        let settings_screen_long = Self::screen_long_axis(settings_layout);
        if screen_long != 0 && screen_long != settings_screen_long {
            return false;
        }
        let layout_dir = Self::layout_dir_axis(screen_layout);
        let settings_layout_dir = Self::layout_dir_axis(settings_layout);
        if layout_dir != 0 && layout_dir != settings_layout_dir {
            return false;
        }

        let ui_type = Self::ui_type_axis(ui_mode);
        let settings_ui_type = Self::ui_type_axis(settings_ui_mode);
        if ui_type != 0 && ui_type != settings_ui_type {
            return false;
        }
        let ui_night = Self::ui_night_axis(ui_mode);
        let settings_ui_night = Self::ui_night_axis(settings_ui_mode);
        if ui_night != 0 && ui_night != settings_ui_night {
            return false;
        }

        let (width_dp, height_dp) = self.get_screen_width_height_dp();
        let (settings_width_dp, settings_height_dp) = settings.get_screen_width_height_dp();
        if width_dp != 0 && settings_width_dp != 0 && width_dp > settings_width_dp {
            return false;
        }
        if height_dp != 0 && settings_height_dp != 0 && height_dp > settings_height_dp {
            return false;
        }

        let (sdk_version, _) = self.get_sdk_minor_version();
        let (settings_sdk_version, _) = settings.get_sdk_minor_version();
        if sdk_version != 0 && settings_sdk_version != 0 && sdk_version > settings_sdk_version {
            return false;
        }
        let (_, minor_version) = self.get_sdk_minor_version();
        let (_, settings_minor_version) = settings.get_sdk_minor_version();
        if minor_version != 0 && settings_minor_version != 0 && minor_version != settings_minor_version
        {
            return false;
        }

        true
    }

    /// Strict refinement order with no request context (§4.4).
    pub fn is_more_specific_than(&self, other: &ResTableConfig) -> bool {
        macro_rules! axis {
            ($a:expr, $b:expr) => {{
                let (a, b) = ($a, $b);
                if (a != 0) != (b != 0) {
                    return a != 0;
                }
                if a != b {
                    // both set but differ: not decisive, keep walking
                }
            }};
        }

        let (mcc, mnc) = self.get_mcc_mnc();
        let (o_mcc, o_mnc) = other.get_mcc_mnc();
        axis!(mcc, o_mcc);
        axis!(mnc, o_mnc);

        let (language, country) = self.get_language_and_country();
        let (o_language, o_country) = other.get_language_and_country();
        let lang_set = language != "any";
        let o_lang_set = o_language != "any";
        if lang_set != o_lang_set {
            return lang_set;
        }
        if lang_set && language == o_language {
            let country_set = country != "any";
            let o_country_set = o_country != "any";
            if country_set != o_country_set {
                return country_set;
            }
        }

        let (screen_layout, ui_mode, smallest_width_dp) =
            self.get_screen_layout_ui_smallest_width();
        let (o_screen_layout, o_ui_mode, o_smallest_width_dp) =
            other.get_screen_layout_ui_smallest_width();

        let layout_dir = Self::layout_dir_axis(screen_layout);
        let o_layout_dir = Self::layout_dir_axis(o_screen_layout);
        axis!(layout_dir, o_layout_dir);

        axis!(smallest_width_dp, o_smallest_width_dp);

        let (width_dp, height_dp) = self.get_screen_width_height_dp();
        let (o_width_dp, o_height_dp) = other.get_screen_width_height_dp();
        let dp_set = width_dp != 0 || height_dp != 0;
        let o_dp_set = o_width_dp != 0 || o_height_dp != 0;
        if dp_set != o_dp_set {
            return dp_set;
        }

        let screen_size = Self::screen_size_axis(screen_layout);
        let o_screen_size = Self::screen_size_axis(o_screen_layout);
        axis!(screen_size, o_screen_size);

        let screen_long = Self::screen_long_axis(screen_layout);
        let o_screen_long = Self::screen_long_axis(o_screen_layout);
        axis!(screen_long, o_screen_long);

        let (orientation, touchscreen, _) = self.get_orientation_touchscreen_density();
        let (o_orientation, o_touchscreen, _) = other.get_orientation_touchscreen_density();
        axis!(orientation, o_orientation);

        let ui_type = Self::ui_type_axis(ui_mode);
        let o_ui_type = Self::ui_type_axis(o_ui_mode);
        axis!(ui_type, o_ui_type);

        let ui_night = Self::ui_night_axis(ui_mode);
        let o_ui_night = Self::ui_night_axis(o_ui_mode);
        axis!(ui_night, o_ui_night);

        axis!(touchscreen, o_touchscreen);

        let (keyboard, navigation, input_flags) = self.get_keyboard_navigation_input_flags();
        let (o_keyboard, o_navigation, o_input_flags) = other.get_keyboard_navigation_input_flags();

        let keys_hidden = Self::keys_hidden_axis(input_flags);
        let o_keys_hidden = Self::keys_hidden_axis(o_input_flags);
        axis!(keys_hidden, o_keys_hidden);

        let nav_hidden = Self::nav_hidden_axis(input_flags);
        let o_nav_hidden = Self::nav_hidden_axis(o_input_flags);
        axis!(nav_hidden, o_nav_hidden);

        axis!(keyboard, o_keyboard);
        axis!(navigation, o_navigation);

        let (screen_width, screen_height) = self.get_screen_width_height();
        let (o_screen_width, o_screen_height) = other.get_screen_width_height();
        let wh_set = screen_width != 0 || screen_height != 0;
        let o_wh_set = o_screen_width != 0 || o_screen_height != 0;
        if wh_set != o_wh_set {
            return wh_set;
        }

        let (sdk_version, minor_version) = self.get_sdk_minor_version();
        let (o_sdk_version, o_minor_version) = other.get_sdk_minor_version();
        axis!(sdk_version, o_sdk_version);
        axis!(minor_version, o_minor_version);

        false
    }

    /// Preference order given a request (§4.4). `None` request falls back to
    /// [`ResTableConfig::is_more_specific_than`].
    pub fn is_better_than(&self, other: &ResTableConfig, request: Option<&ResTableConfig>) -> bool {
        let Some(request) = request else {
            return self.is_more_specific_than(other);
        };

        let (mcc, mnc) = self.get_mcc_mnc();
        let (o_mcc, o_mnc) = other.get_mcc_mnc();
        let (r_mcc, r_mnc) = request.get_mcc_mnc();

        if r_mcc != 0 && mcc != o_mcc {
            return mcc != 0;
        }
        if r_mnc != 0 && mnc != o_mnc {
            return mnc != 0;
        }

        let (language, country) = self.get_language_and_country();
        let (o_language, o_country) = other.get_language_and_country();
        let (r_language, r_country) = request.get_language_and_country();
        if r_language != "any" && language != o_language {
            if r_language == "en" && r_country == "US" {
                let us_like =
                    |c: &str| c == "any" || c.eq_ignore_ascii_case("US");
                let self_us = us_like(&country);
                let other_us = us_like(&o_country);
                if self_us != other_us {
                    return self_us;
                }
            }
            let self_set = language != "any";
            let other_set = o_language != "any";
            if self_set != other_set {
                return self_set;
            }
            let self_eq = language == r_language;
            let other_eq = o_language == r_language;
            if self_eq != other_eq {
                return self_eq;
            }
        } else if r_language != "any" && country != o_country {
            let self_set = country != "any";
            let other_set = o_country != "any";
            if self_set != other_set {
                return self_set;
            }
            let self_eq = country == r_country;
            let other_eq = o_country == r_country;
            if self_eq != other_eq {
                return self_eq;
            }
        }

        let (screen_layout, ui_mode, smallest_width_dp) =
            self.get_screen_layout_ui_smallest_width();
        let (o_screen_layout, o_ui_mode, o_smallest_width_dp) =
            other.get_screen_layout_ui_smallest_width();
        let (r_screen_layout, r_ui_mode, r_smallest_width_dp) =
            request.get_screen_layout_ui_smallest_width();

        let layout_dir = Self::layout_dir_axis(screen_layout);
        let o_layout_dir = Self::layout_dir_axis(o_screen_layout);
        let r_layout_dir = Self::layout_dir_axis(r_screen_layout);
        if r_layout_dir != 0 && layout_dir != o_layout_dir {
            return layout_dir != 0;
        }

        if r_smallest_width_dp != 0 && smallest_width_dp != o_smallest_width_dp {
            let d_self = (r_smallest_width_dp as i32) - (smallest_width_dp as i32);
            let d_other = (r_smallest_width_dp as i32) - (o_smallest_width_dp as i32);
            if let Some(winner) = closer_nonnegative(d_self, d_other) {
                return winner;
            }
        }

        let (width_dp, height_dp) = self.get_screen_width_height_dp();
        let (o_width_dp, o_height_dp) = other.get_screen_width_height_dp();
        let (r_width_dp, r_height_dp) = request.get_screen_width_height_dp();
        if r_width_dp != 0 && r_height_dp != 0 && (width_dp, height_dp) != (o_width_dp, o_height_dp)
        {
            let d_self = ((r_width_dp as i32) - (width_dp as i32)).abs()
                + ((r_height_dp as i32) - (height_dp as i32)).abs();
            let d_other = ((r_width_dp as i32) - (o_width_dp as i32)).abs()
                + ((r_height_dp as i32) - (o_height_dp as i32)).abs();
            if d_self != d_other {
                return d_self < d_other;
            }
        }

        let screen_size = Self::screen_size_axis(screen_layout);
        let o_screen_size = Self::screen_size_axis(o_screen_layout);
        let r_screen_size = Self::screen_size_axis(r_screen_layout);
        // A bigger screen size is better, unless it would overshoot the
        // request: an unset candidate always loses to a set one, and among
        // two sizes that both fit the request the larger wins; among two
        // that both overshoot, the smaller (closer) wins.
        if screen_size != o_screen_size && r_screen_size != 0 {
            if screen_size == 0 {
                return false;
            } else if o_screen_size == 0 {
                return true;
            } else if screen_size <= r_screen_size && o_screen_size <= r_screen_size {
                return screen_size > o_screen_size;
            } else if screen_size <= r_screen_size {
                return true;
            } else if o_screen_size <= r_screen_size {
                return false;
            } else {
                return screen_size < o_screen_size;
            }
        }

        let screen_long = Self::screen_long_axis(screen_layout);
        let o_screen_long = Self::screen_long_axis(o_screen_layout);
        let r_screen_long = Self::screen_long_axis(r_screen_layout);
        if r_screen_long != 0 && screen_long != o_screen_long {
            return screen_long != 0;
        }

        let (orientation, touchscreen, density) = self.get_orientation_touchscreen_density();
        let (o_orientation, o_touchscreen, o_density) = other.get_orientation_touchscreen_density();
        let (r_orientation, r_touchscreen, r_density) = request.get_orientation_touchscreen_density();

        if r_orientation != 0 && orientation != o_orientation {
            return orientation != 0;
        }

        let ui_type = Self::ui_type_axis(ui_mode);
        let o_ui_type = Self::ui_type_axis(o_ui_mode);
        let r_ui_type = Self::ui_type_axis(r_ui_mode);
        if r_ui_type != 0 && ui_type != o_ui_type {
            return ui_type != 0;
        }

        let ui_night = Self::ui_night_axis(ui_mode);
        let o_ui_night = Self::ui_night_axis(o_ui_mode);
        let r_ui_night = Self::ui_night_axis(r_ui_mode);
        if r_ui_night != 0 && ui_night != o_ui_night {
            return ui_night != 0;
        }

        if r_touchscreen != 0 && touchscreen != o_touchscreen {
            return touchscreen != 0;
        }

        if r_density != 0 && density != o_density {
            return density_is_better(density, o_density, r_density);
        }

        let (keyboard, navigation, input_flags) = self.get_keyboard_navigation_input_flags();
        let (o_keyboard, o_navigation, o_input_flags) = other.get_keyboard_navigation_input_flags();
        let (r_keyboard, r_navigation, r_input_flags) = request.get_keyboard_navigation_input_flags();

        let keys_hidden = Self::keys_hidden_axis(input_flags);
        let o_keys_hidden = Self::keys_hidden_axis(o_input_flags);
        let r_keys_hidden = Self::keys_hidden_axis(r_input_flags);
        if r_keys_hidden != 0 && keys_hidden != o_keys_hidden {
            let self_set = keys_hidden != 0;
            let other_set = o_keys_hidden != 0;
            if self_set != other_set {
                return self_set;
            }
            return keys_hidden == r_keys_hidden;
        }

        let nav_hidden = Self::nav_hidden_axis(input_flags);
        let o_nav_hidden = Self::nav_hidden_axis(o_input_flags);
        let r_nav_hidden = Self::nav_hidden_axis(r_input_flags);
        if r_nav_hidden != 0 && nav_hidden != o_nav_hidden {
            let self_set = nav_hidden != 0;
            let other_set = o_nav_hidden != 0;
            if self_set != other_set {
                return self_set;
            }
            return nav_hidden == r_nav_hidden;
        }

        if r_keyboard != 0 && keyboard != o_keyboard {
            let self_set = keyboard != 0;
            let other_set = o_keyboard != 0;
            if self_set != other_set {
                return self_set;
            }
            return keyboard == r_keyboard;
        }

        if r_navigation != 0 && navigation != o_navigation {
            let self_set = navigation != 0;
            let other_set = o_navigation != 0;
            if self_set != other_set {
                return self_set;
            }
            return navigation == r_navigation;
        }

        let (screen_width, screen_height) = self.get_screen_width_height();
        let (o_screen_width, o_screen_height) = other.get_screen_width_height();
        let (r_screen_width, r_screen_height) = request.get_screen_width_height();
        if r_screen_width != 0
            && r_screen_height != 0
            && (screen_width, screen_height) != (o_screen_width, o_screen_height)
        {
            let d_self = (r_screen_width as i32 - screen_width as i32).max(0)
                + (r_screen_height as i32 - screen_height as i32).max(0);
            let d_other = (r_screen_width as i32 - o_screen_width as i32).max(0)
                + (r_screen_height as i32 - o_screen_height as i32).max(0);
            if d_self != d_other {
                return d_self < d_other;
            }
        }

        let (sdk_version, minor_version) = self.get_sdk_minor_version();
        let (o_sdk_version, o_minor_version) = other.get_sdk_minor_version();
        let (r_sdk_version, r_minor_version) = request.get_sdk_minor_version();
        if r_sdk_version != 0 && sdk_version != o_sdk_version {
            let d_self = (r_sdk_version as i32 - sdk_version as i32).max(0);
            let d_other = (r_sdk_version as i32 - o_sdk_version as i32).max(0);
            if d_self != d_other {
                return d_self < d_other;
            }
        }
        if r_minor_version != 0 && minor_version != o_minor_version {
            let self_set = minor_version != 0;
            let other_set = o_minor_version != 0;
            if self_set != other_set {
                return self_set;
            }
            return minor_version == r_minor_version;
        }

        false
    }
}

/// Distance-to-request comparison shared by the dp/pixel axes: smaller
/// non-negative delta wins. Returns `None` if neither side is closer
/// (both negative, i.e. both larger than the request, or exactly tied).
fn closer_nonnegative(d_self: i32, d_other: i32) -> Option<bool> {
    match (d_self >= 0, d_other >= 0) {
        (true, true) => {
            if d_self == d_other {
                None
            } else {
                Some(d_self < d_other)
            }
        }
        (true, false) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Android's density tie-break (§4.4, §9): preserved exactly as specified,
/// not simplified, because mixed-density drawable sets depend on it.
fn density_is_better(density: u16, other: u16, request: u16) -> bool {
    let l = if density == 0 { 160 } else { density as i64 };
    let h = if other == 0 { 160 } else { other as i64 };
    let (l, h, density_is_low) = if l > h { (h, l, false) } else { (l, h, true) };
    let req = if request == 0 { 160 } else { request as i64 };

    let prefer_low = if req >= h {
        false
    } else if l >= req {
        true
    } else if (2 * l - req) * h > req * req {
        true
    } else {
        false
    };

    if prefer_low { density_is_low } else { !density_is_low }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_screen_layout_size(config: ResTableConfig, size: u8) -> ResTableConfig {
        let (screen_layout, ui_mode, smallest) = config.get_screen_layout_ui_smallest_width();
        let screen_layout = (screen_layout & !0x0F) | (size & 0x0F);
        ResTableConfig {
            screen_config: (screen_layout as u32) | ((ui_mode as u32) << 8) | ((smallest as u32) << 16),
            ..config
        }
    }

    // §8.3: a config identical to `settings` on every axis it sets must match.
    #[test]
    fn match_is_monotone_on_identical_axes() {
        let settings = ResTableConfig::new()
            .with_locale("ja", "JP")
            .with_sdk_version(30)
            .with_density(320);
        let c = ResTableConfig::new().with_locale("ja", "JP").with_sdk_version(21);
        assert!(c.matches(Some(&settings)));
    }

    #[test]
    fn match_nil_settings_matches_everything() {
        let c = ResTableConfig::new()
            .with_locale("fr", "FR")
            .with_mcc_mnc(208, 1);
        assert!(c.matches(None));
    }

    #[test]
    fn match_language_qualified_resource_requires_language_on_request() {
        let c = ResTableConfig::new().with_locale("ja", "");
        assert!(!c.matches(Some(&ResTableConfig::new())));
        assert!(c.matches(Some(&ResTableConfig::new().with_locale("ja", "JP"))));
        assert!(!c.matches(Some(&ResTableConfig::new().with_locale("en", "US"))));
    }

    #[test]
    fn match_country_only_decides_when_set_on_candidate() {
        let c = ResTableConfig::new().with_locale("pt", "BR");
        assert!(!c.matches(Some(&ResTableConfig::new().with_locale("pt", "PT"))));
        assert!(c.matches(Some(&ResTableConfig::new().with_locale("pt", "BR"))));

        let unset_country = ResTableConfig::new().with_locale("pt", "");
        assert!(unset_country.matches(Some(&ResTableConfig::new().with_locale("pt", "PT"))));
    }

    #[test]
    fn match_imsi_mcc_requires_request_to_have_mcc() {
        let c = ResTableConfig::new().with_mcc_mnc(250, 0);
        assert!(!c.matches(Some(&ResTableConfig::new())));
        assert!(c.matches(Some(&ResTableConfig::new().with_mcc_mnc(250, 99))));
        assert!(!c.matches(Some(&ResTableConfig::new().with_mcc_mnc(310, 0))));
    }

    #[test]
    fn match_screen_dimensions_require_device_at_least_as_large() {
        let c = ResTableConfig::new().with_smallest_screen_width_dp(600);
        assert!(c.matches(Some(&ResTableConfig::new().with_smallest_screen_width_dp(720))));
        assert!(!c.matches(Some(&ResTableConfig::new().with_smallest_screen_width_dp(480))));
    }

    #[test]
    fn match_sdk_version_requires_device_at_least_as_new() {
        let c = ResTableConfig::new().with_sdk_version(26);
        assert!(c.matches(Some(&ResTableConfig::new().with_sdk_version(34))));
        assert!(!c.matches(Some(&ResTableConfig::new().with_sdk_version(21))));
    }

    // §8.2: irreflexivity.
    #[test]
    fn specificity_is_irreflexive() {
        let configs = [
            ResTableConfig::new(),
            ResTableConfig::new().with_locale("ja", "JP"),
            ResTableConfig::new().with_mcc_mnc(1, 1),
            ResTableConfig::new().with_sdk_version(30).with_density(320),
        ];
        for c in configs {
            assert!(!c.is_more_specific_than(&c));
        }
    }

    // §8 boundary D.
    #[test]
    fn mnc_is_more_specific_than_mcc_alone() {
        let mcc_mnc = ResTableConfig::new().with_mcc_mnc(1, 1);
        let mcc_only = ResTableConfig::new().with_mcc_mnc(1, 0);
        assert!(mcc_mnc.is_more_specific_than(&mcc_only));
        assert!(!mcc_only.is_more_specific_than(&mcc_mnc));
    }

    // §8.1: antisymmetry, sampled over a grid of distinguishing pairs.
    #[test]
    fn is_better_than_is_antisymmetric() {
        let request = ResTableConfig::new()
            .with_locale("en", "US")
            .with_sdk_version(30)
            .with_density(420)
            .with_screen_width_height_dp(411, 891);
        let configs = [
            ResTableConfig::new(),
            ResTableConfig::new().with_locale("en", "US"),
            ResTableConfig::new().with_locale("en", "GB"),
            ResTableConfig::new().with_locale("ja", "JP"),
            ResTableConfig::new().with_sdk_version(21),
            ResTableConfig::new().with_sdk_version(30),
            ResTableConfig::new().with_density(160),
            ResTableConfig::new().with_density(480),
            with_screen_layout_size(ResTableConfig::new(), 1),
            with_screen_layout_size(ResTableConfig::new(), 4),
        ];
        for a in &configs {
            for b in &configs {
                if a.is_better_than(b, Some(&request)) {
                    assert!(
                        !b.is_better_than(a, Some(&request)),
                        "both {:?} and {:?} claimed to be better than each other",
                        a,
                        b
                    );
                }
            }
        }
    }

    // §8 boundary E: a small-screen resource beats no resource at all, even
    // for an extra-large request.
    #[test]
    fn small_screen_resource_beats_unspecified_fallback_for_xlarge_request() {
        let small = with_screen_layout_size(ResTableConfig::new(), 1); // SMALL
        let fallback = ResTableConfig::new();
        let request = with_screen_layout_size(ResTableConfig::new(), 4); // XLARGE
        assert!(small.is_better_than(&fallback, Some(&request)));
    }

    #[test]
    fn is_better_than_with_nil_request_falls_back_to_specificity() {
        let more_specific = ResTableConfig::new().with_locale("ja", "JP");
        let less_specific = ResTableConfig::new();
        assert!(more_specific.is_better_than(&less_specific, None));
        assert!(!less_specific.is_better_than(&more_specific, None));
    }

    #[test]
    fn us_english_fallback_prefers_unqualified_or_us_country() {
        let request = ResTableConfig::new().with_locale("en", "US");
        let gb = ResTableConfig::new().with_locale("en", "GB");
        let unqualified_country = ResTableConfig::new().with_locale("en", "");
        assert!(unqualified_country.is_better_than(&gb, Some(&request)));
        assert!(!gb.is_better_than(&unqualified_country, Some(&request)));
    }

    #[test]
    fn density_tie_break_prefers_closer_density_above_request() {
        // request 160: candidate exactly at request beats both a lower and a higher density.
        assert!(density_is_better(160, 240, 160));
        assert!(density_is_better(160, 120, 160));
    }

    #[test]
    fn density_tie_break_formula_matches_native_runtime() {
        // req=160, l=120, h=240: (2*120-160)*240 = 19200 > 160*160=25600? no -> prefer high (240)
        assert!(!density_is_better(120, 240, 160));
        assert!(density_is_better(240, 120, 160));
    }

    // §8.4: zero-fill compatibility — a short on-disk struct parses
    // identically to one zero-extended to the full 64-byte layout.
    #[test]
    fn short_struct_parses_identically_to_zero_extended() {
        // size=28 ("version" is the last field present; old aapt-emitted configs)
        let mut short_bytes = vec![0u8; 28];
        short_bytes[0..4].copy_from_slice(&28u32.to_le_bytes()); // size
        short_bytes[4..8].copy_from_slice(&250u32.to_le_bytes()); // imsi (mcc=250)
        short_bytes[24..28].copy_from_slice(&30u32.to_le_bytes()); // version (sdk=30)

        let mut full_bytes = vec![0u8; 64];
        full_bytes[0..4].copy_from_slice(&64u32.to_le_bytes());
        full_bytes[4..8].copy_from_slice(&250u32.to_le_bytes());
        full_bytes[24..28].copy_from_slice(&30u32.to_le_bytes());

        let short = ResTableConfig::parse(&mut short_bytes.as_slice()).unwrap();
        let full = ResTableConfig::parse(&mut full_bytes.as_slice()).unwrap();

        assert_eq!(short.imsi, full.imsi);
        assert_eq!(short.version, full.version);
        assert_eq!(short.screen_config, full.screen_config);
        assert_eq!(short.get_mcc_mnc(), full.get_mcc_mnc());
        assert_eq!(short.get_sdk_minor_version(), full.get_sdk_minor_version());
    }
}
