//! GXM texture format, base format and texture type codes.
//!
//! All three are thin wrappers over the raw `u32` values found in GXT
//! control words, so that unknown values survive parsing and can be
//! reported in errors.


use derive_more::Display;


/// A complete `SceGxmTextureFormat` code: [base format][`BaseFormat`] in the
/// upper 16 bits, component swizzle in bits 12..16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFormat(pub u32);


#[allow(missing_docs)]
impl TextureFormat {
	pub const U8_1RRR: Self = Self(0x0000_5000);
	pub const U8_R000: Self = Self(0x0000_6000);
	pub const U4U4U4U4_ARGB: Self = Self(0x0200_1000);
	pub const U1U5U5U5_ARGB: Self = Self(0x0400_1000);
	pub const U5U6U5_BGR: Self = Self(0x0500_0000);
	pub const U5U6U5_RGB: Self = Self(0x0500_1000);
	pub const U8U8_00GR: Self = Self(0x0700_1000);
	pub const U8U8_RGGG: Self = Self(0x0700_3000);
	pub const U8U8U8U8_ABGR: Self = Self(0x0C00_0000);
	pub const U8U8U8U8_ARGB: Self = Self(0x0C00_1000);
	pub const U8U8U8U8_RGBA: Self = Self(0x0C00_2000);
	pub const U8U8U8U8_BGRA: Self = Self(0x0C00_3000);
	pub const X8U8U8U8_1BGR: Self = Self(0x0C00_4000);
	pub const X8U8U8U8_1RGB: Self = Self(0x0C00_5000);
	pub const U8U8U8X8_RGB1: Self = Self(0x0C00_6000);
	pub const U8U8U8X8_BGR1: Self = Self(0x0C00_7000);
	pub const PVRT2BPP_ABGR: Self = Self(0x8000_0000);
	pub const PVRT2BPP_1BGR: Self = Self(0x8000_4000);
	pub const PVRT4BPP_ABGR: Self = Self(0x8100_0000);
	pub const PVRT4BPP_1BGR: Self = Self(0x8100_4000);
	pub const PVRTII2BPP_ABGR: Self = Self(0x8200_0000);
	pub const PVRTII4BPP_ABGR: Self = Self(0x8300_0000);
	pub const UBC1_ABGR: Self = Self(0x8500_0000);
	pub const UBC2_ABGR: Self = Self(0x8600_0000);
	pub const UBC3_ABGR: Self = Self(0x8700_0000);
	pub const P4_ABGR: Self = Self(0x9400_0000);
	pub const P8_ABGR: Self = Self(0x9500_0000);
	pub const U8U8U8_BGR: Self = Self(0x9800_0000);
	pub const U8U8U8_RGB: Self = Self(0x9800_1000);


	/// Return the [`BaseFormat`] part of this code.
	///
	/// # Example
	/// ```
	/// # use vita_gxt::{TextureFormat, BaseFormat};
	/// assert_eq!(TextureFormat::P8_ABGR.base(), BaseFormat::P8);
	/// assert_eq!(TextureFormat(0x9500_3000).base(), BaseFormat::P8);
	/// ```
	pub const fn base(self) -> BaseFormat {
		BaseFormat(self.0 & 0xFFFF_0000)
	}


	/// Return the raw swizzle selector (bits 12..16).
	pub const fn swizzle(self) -> u32 {
		(self.0 >> 12) & 0xF
	}


	/// Interpret the swizzle as a four-component [`ChannelOrder`].
	///
	/// Only meaningful for bases with four components (see
	/// [`BaseFormat::components`]).
	pub const fn channel_order(self) -> ChannelOrder {
		ChannelOrder::from_swizzle4(self.swizzle())
	}


	/// Human-readable GXM name such as `"U8U8U8U8_ARGB"`, if both the base
	/// format and its swizzle are known.
	pub fn name(self) -> Option<String> {
		const SWIZZLE1: [&str; 8] = ["R", "000R", "111R", "RRRR", "0RRR", "1RRR", "R000", "R111"];
		const SWIZZLE2: [&str; 6] = ["GR", "00GR", "GRRR", "RGGG", "GRGR", "00RG"];
		const SWIZZLE3: [&str; 2] = ["BGR", "RGB"];

		let base = self.base();
		let base_name = base.name()?;
		let swizzle = self.swizzle() as usize;

		let swizzle_name = match base.components() {
			1 => SWIZZLE1.get(swizzle).copied(),
			2 => SWIZZLE2.get(swizzle).copied(),
			3 => SWIZZLE3.get(swizzle).copied(),
			_ => ChannelOrder::ALL.get(swizzle).map(|c| c.name()),
		}?;

		let base_name = match (base, swizzle) {
			(BaseFormat::U8U8U8U8, 4 | 5) => "X8U8U8U8",
			(BaseFormat::U8U8U8U8, 6 | 7) => "U8U8U8X8",
			_ => base_name,
		};

		Some(format!("{}_{}", base_name, swizzle_name))
	}
}


impl std::fmt::Display for TextureFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.name() {
			Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
			None => write!(f, "0x{:08X}", self.0),
		}
	}
}


/// `SceGxmTextureBaseFormat`: the storage scheme of a texture, without its
/// component swizzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseFormat(pub u32);


#[allow(missing_docs)]
impl BaseFormat {
	pub const U8: Self = Self(0x0000_0000);
	pub const U4U4U4U4: Self = Self(0x0200_0000);
	pub const U1U5U5U5: Self = Self(0x0400_0000);
	pub const U5U6U5: Self = Self(0x0500_0000);
	pub const U8U8: Self = Self(0x0700_0000);
	pub const U8U8U8U8: Self = Self(0x0C00_0000);
	pub const PVRT2BPP: Self = Self(0x8000_0000);
	pub const PVRT4BPP: Self = Self(0x8100_0000);
	pub const PVRTII2BPP: Self = Self(0x8200_0000);
	pub const PVRTII4BPP: Self = Self(0x8300_0000);
	pub const UBC1: Self = Self(0x8500_0000);
	pub const UBC2: Self = Self(0x8600_0000);
	pub const UBC3: Self = Self(0x8700_0000);
	pub const P4: Self = Self(0x9400_0000);
	pub const P8: Self = Self(0x9500_0000);
	pub const U8U8U8: Self = Self(0x9800_0000);


	const NAMES: [(Self, &'static str); 16] = [
		(Self::U8, "U8"),
		(Self::U4U4U4U4, "U4U4U4U4"),
		(Self::U1U5U5U5, "U1U5U5U5"),
		(Self::U5U6U5, "U5U6U5"),
		(Self::U8U8, "U8U8"),
		(Self::U8U8U8U8, "U8U8U8U8"),
		(Self::PVRT2BPP, "PVRT2BPP"),
		(Self::PVRT4BPP, "PVRT4BPP"),
		(Self::PVRTII2BPP, "PVRTII2BPP"),
		(Self::PVRTII4BPP, "PVRTII4BPP"),
		(Self::UBC1, "UBC1"),
		(Self::UBC2, "UBC2"),
		(Self::UBC3, "UBC3"),
		(Self::P4, "P4"),
		(Self::P8, "P8"),
		(Self::U8U8U8, "U8U8U8"),
	];


	/// GXM name of the base format, if known.
	pub fn name(self) -> Option<&'static str> {
		Self::NAMES.iter()
			.find(|(base, _)| *base == self)
			.map(|(_, name)| *name)
	}


	/// Number of swizzled components, which selects the swizzle naming table.
	pub const fn components(self) -> u8 {
		match self {
			Self::U8 => 1,
			Self::U8U8 => 2,
			Self::U5U6U5 | Self::U8U8U8 => 3,
			_ => 4,
		}
	}


	/// Return true for the palettized bases ([`P4`][Self::P4] and [`P8`][Self::P8]).
	///
	/// # Example
	/// ```
	/// # use vita_gxt::BaseFormat;
	/// assert!(BaseFormat::P4.is_indexed());
	/// assert!(!BaseFormat::UBC1.is_indexed());
	/// ```
	pub const fn is_indexed(self) -> bool {
		matches!(self, Self::P4 | Self::P8)
	}


	/// Return true for the PVRTC bases, which are stored with their own word
	/// twiddling and never go through the arrangement un-scrambler.
	pub const fn is_pvrtc(self) -> bool {
		matches!(self, Self::PVRT2BPP | Self::PVRT4BPP | Self::PVRTII2BPP | Self::PVRTII4BPP)
	}


	/// Return true for the DXTn bases.
	pub const fn is_dxtn(self) -> bool {
		matches!(self, Self::UBC1 | Self::UBC2 | Self::UBC3)
	}
}


impl std::fmt::Display for BaseFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.name() {
			Some(name) => write!(f, "{}", name),
			None => write!(f, "0x{:08X}", self.0),
		}
	}
}


/// `SceGxmTextureType`: the on-chip memory arrangement of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureType(pub u32);


#[allow(missing_docs)]
impl TextureType {
	pub const SWIZZLED: Self = Self(0x0000_0000);
	pub const CUBE: Self = Self(0x4000_0000);
	pub const LINEAR: Self = Self(0x6000_0000);
	pub const TILED: Self = Self(0x8000_0000);
	pub const SWIZZLED_ARBITRARY: Self = Self(0xA000_0000);
	pub const LINEAR_STRIDED: Self = Self(0xC000_0000);
	pub const CUBE_ARBITRARY: Self = Self(0xE000_0000);


	/// GXM name of the texture type, if known.
	pub const fn name(self) -> Option<&'static str> {
		match self {
			Self::SWIZZLED => Some("Swizzled"),
			Self::CUBE => Some("Cube"),
			Self::LINEAR => Some("Linear"),
			Self::TILED => Some("Tiled"),
			Self::SWIZZLED_ARBITRARY => Some("SwizzledArbitrary"),
			Self::LINEAR_STRIDED => Some("LinearStrided"),
			Self::CUBE_ARBITRARY => Some("CubeArbitrary"),
			_ => None,
		}
	}
}


impl std::fmt::Display for TextureType {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.name() {
			Some(name) => write!(f, "{}", name),
			None => write!(f, "0x{:08X}", self.0),
		}
	}
}


/// Four-component swizzle (`SceGxmTextureSwizzle4Mode`), naming components
/// from the most significant byte of a little-endian 32-bit word down
///
/// The `1` variants ignore the stored alpha byte and force it to `0xFF`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
	/// A in bits 24..32, R in bits 0..8.
	#[display(fmt = "ABGR")]
	Abgr,
	/// A in bits 24..32, B in bits 0..8.
	#[display(fmt = "ARGB")]
	Argb,
	/// R in bits 24..32, A in bits 0..8.
	#[display(fmt = "RGBA")]
	Rgba,
	/// B in bits 24..32, A in bits 0..8.
	#[display(fmt = "BGRA")]
	Bgra,
	/// Like [`Abgr`][Self::Abgr], opaque.
	#[display(fmt = "1BGR")]
	OneBgr,
	/// Like [`Argb`][Self::Argb], opaque.
	#[display(fmt = "1RGB")]
	OneRgb,
	/// Like [`Rgba`][Self::Rgba], opaque.
	#[display(fmt = "RGB1")]
	RgbOne,
	/// Like [`Bgra`][Self::Bgra], opaque.
	#[display(fmt = "BGR1")]
	BgrOne,
}


impl ChannelOrder {
	/// All orders, indexed by their swizzle selector.
	pub const ALL: [Self; 8] = [
		Self::Abgr, Self::Argb, Self::Rgba, Self::Bgra,
		Self::OneBgr, Self::OneRgb, Self::RgbOne, Self::BgrOne,
	];


	/// Map a swizzle selector (bits 12..16 of a format code) to an order.
	/// Only the low three bits are significant.
	pub const fn from_swizzle4(selector: u32) -> Self {
		Self::ALL[(selector & 0x7) as usize]
	}


	fn name(self) -> &'static str {
		match self {
			Self::Abgr => "ABGR",
			Self::Argb => "ARGB",
			Self::Rgba => "RGBA",
			Self::Bgra => "BGRA",
			Self::OneBgr => "1BGR",
			Self::OneRgb => "1RGB",
			Self::RgbOne => "RGB1",
			Self::BgrOne => "BGR1",
		}
	}


	/// Resolve a raw 32-bit word to an `[r, g, b, a]` display colour.
	///
	/// # Example
	/// ```
	/// # use vita_gxt::ChannelOrder;
	/// assert_eq!(ChannelOrder::Abgr.to_rgba(0xFF10_2030), [0x30, 0x20, 0x10, 0xFF]);
	/// assert_eq!(ChannelOrder::Argb.to_rgba(0x8010_2030), [0x10, 0x20, 0x30, 0x80]);
	/// assert_eq!(ChannelOrder::OneRgb.to_rgba(0x0010_2030), [0x10, 0x20, 0x30, 0xFF]);
	/// ```
	#[allow(clippy::cast_possible_truncation)]
	pub const fn to_rgba(self, value: u32) -> [u8; 4] {
		let b3 = (value >> 24) as u8;
		let b2 = (value >> 16) as u8;
		let b1 = (value >> 8) as u8;
		let b0 = value as u8;

		match self {
			Self::Abgr => [b0, b1, b2, b3],
			Self::Argb => [b2, b1, b0, b3],
			Self::Rgba => [b3, b2, b1, b0],
			Self::Bgra => [b1, b2, b3, b0],
			Self::OneBgr => [b0, b1, b2, 0xFF],
			Self::OneRgb => [b2, b1, b0, 0xFF],
			Self::RgbOne => [b3, b2, b1, 0xFF],
			Self::BgrOne => [b1, b2, b3, 0xFF],
		}
	}


	/// Same as [`to_rgba`][Self::to_rgba], in the `[b, g, r, a]` byte order
	/// of [`PixelLayout::Bgra8888`][crate::PixelLayout::Bgra8888].
	pub const fn to_bgra(self, value: u32) -> [u8; 4] {
		let [r, g, b, a] = self.to_rgba(value);
		[b, g, r, a]
	}
}


#[test]
fn format_names() {
	assert_eq!(TextureFormat::U8U8U8U8_ARGB.name().as_deref(), Some("U8U8U8U8_ARGB"));
	assert_eq!(TextureFormat::U8U8U8X8_RGB1.name().as_deref(), Some("U8U8U8X8_RGB1"));
	assert_eq!(TextureFormat::U8_1RRR.name().as_deref(), Some("U8_1RRR"));
	assert_eq!(TextureFormat::U8U8_RGGG.name().as_deref(), Some("U8U8_RGGG"));
	assert_eq!(TextureFormat::U5U6U5_RGB.name().as_deref(), Some("U5U6U5_RGB"));
	assert_eq!(TextureFormat::UBC3_ABGR.name().as_deref(), Some("UBC3_ABGR"));
	assert_eq!(TextureFormat(0x1234_0000).name(), None);
	assert_eq!(TextureFormat(0x1234_0000).to_string(), "0x12340000");
	assert_eq!(TextureType::LINEAR.to_string(), "Linear");
	assert_eq!(TextureType(0x1000_0000).to_string(), "0x10000000");
}


#[test]
fn channel_order_from_format() {
	assert_eq!(TextureFormat::P8_ABGR.channel_order(), ChannelOrder::Abgr);
	assert_eq!(TextureFormat(0x9400_3000).channel_order(), ChannelOrder::Bgra);
	assert_eq!(TextureFormat::X8U8U8U8_1RGB.channel_order(), ChannelOrder::OneRgb);
	assert_eq!(TextureFormat::PVRT4BPP_1BGR.channel_order(), ChannelOrder::OneBgr);
}


#[test]
fn channel_order_components() {
	let word = 0x4433_2211;
	assert_eq!(ChannelOrder::Abgr.to_rgba(word), [0x11, 0x22, 0x33, 0x44]);
	assert_eq!(ChannelOrder::Argb.to_rgba(word), [0x33, 0x22, 0x11, 0x44]);
	assert_eq!(ChannelOrder::Rgba.to_rgba(word), [0x44, 0x33, 0x22, 0x11]);
	assert_eq!(ChannelOrder::Bgra.to_rgba(word), [0x22, 0x33, 0x44, 0x11]);
	assert_eq!(ChannelOrder::BgrOne.to_rgba(word), [0x22, 0x33, 0x44, 0xFF]);
	assert_eq!(ChannelOrder::Argb.to_bgra(word), [0x11, 0x22, 0x33, 0x44]);
}
