//! Style registry and resolver
//!
//! The registry maps a value type to a storage style, then creates or loads
//! vectors of that style. It holds three tables:
//!
//! - style codecs, consulted in priority order: user codecs (in registration
//!   order), then the built-ins: elemental, array-like, composite, text
//!   (only with [`VectorRegistry::with_json`]) and byte-serialized
//! - native conversions for `bool`, `char`, enums and user logical types
//! - per-type-name style overrides set by a type's author
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = VectorRegistry::standard().with_json();
//! let mut v = registry.create(&root, "points", &desc, &VectorOptions::default())?;
//! v.push(value)?;
//! let again = registry.load(&root.group("points")?)?;
//! ```
//!
//! Resolution is a pure function of the registry, the type and the persisted
//! options, so loading re-derives the style the vector was created with. The
//! resolved style's tag is also persisted; a mismatch on load is reported
//! instead of reading the data with the wrong layout.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use chunkvec_core::{Error, Result, StorageStyle, TypeDesc, Value, VectorOptions};
use chunkvec_storage::Group;

use crate::array::ArrayCodec;
use crate::codec::{StyleCodec, VectorContext};
use crate::composite::CompositeCodec;
use crate::conversion::{
    conversion_key, BoolConversion, CharConversion, EnumConversion, NativeConversion,
};
use crate::elemental::ElementalCodec;
use crate::metadata::MetadataRecord;
use crate::serialized::SerializedCodec;
use crate::vector::DynVector;

// =============================================================================
// Style overrides
// =============================================================================

/// Style a type's author pins for a named type
///
/// Overrides bypass the priority order for that type name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleOverride {
    /// One child vector per field, even for types that would pack elementally
    Composite,
    /// Byte-serialized, whatever the type's shape
    Serialized,
    /// Text-serialized JSON; byte-serialized if the JSON codec is absent
    Json,
}

// =============================================================================
// Registry
// =============================================================================

/// Resolver plus the codecs and conversions it resolves with
pub struct VectorRegistry {
    /// Plugin codecs, consulted before the built-ins
    user_codecs: Vec<Arc<dyn StyleCodec>>,
    /// Built-in codecs in priority order
    builtins: Vec<Arc<dyn StyleCodec>>,
    /// Logical type key -> native conversion
    conversions: HashMap<String, Arc<dyn NativeConversion>>,
    /// Type name -> pinned style
    overrides: HashMap<String, StyleOverride>,
    /// True once the JSON text codec is registered
    json: bool,
}

impl VectorRegistry {
    /// Registry with the built-in styles and conversions
    pub fn standard() -> Self {
        let builtins: Vec<Arc<dyn StyleCodec>> = vec![
            Arc::new(ElementalCodec),
            Arc::new(ArrayCodec),
            Arc::new(CompositeCodec),
            Arc::new(SerializedCodec::bytes()),
        ];
        let mut conversions: HashMap<String, Arc<dyn NativeConversion>> = HashMap::new();
        conversions.insert("bool".to_string(), Arc::new(BoolConversion));
        conversions.insert("char".to_string(), Arc::new(CharConversion));
        conversions.insert("enum".to_string(), Arc::new(EnumConversion));

        VectorRegistry {
            user_codecs: Vec::new(),
            builtins,
            conversions,
            overrides: HashMap::new(),
            json: false,
        }
    }

    /// Add the JSON text-serialized style, ahead of byte serialization
    pub fn with_json(mut self) -> Self {
        if !self.json {
            let at = self
                .builtins
                .iter()
                .position(|c| c.handles(&StorageStyle::ByteSerialized))
                .unwrap_or(self.builtins.len());
            self.builtins.insert(at, Arc::new(SerializedCodec::text()));
            self.json = true;
        }
        self
    }

    /// True if the JSON text codec is registered
    pub fn has_json(&self) -> bool {
        self.json
    }

    /// Register a plugin codec
    ///
    /// Plugin codecs are consulted before every built-in, in registration
    /// order.
    pub fn register_codec(&mut self, codec: Arc<dyn StyleCodec>) {
        debug!(target: "chunkvec::registry", id = codec.id(), "Registered codec");
        self.user_codecs.push(codec);
    }

    /// Builder form of [`register_codec`](Self::register_codec)
    pub fn with_codec(mut self, codec: Arc<dyn StyleCodec>) -> Self {
        self.register_codec(codec);
        self
    }

    /// Register the native conversion of logical type `name`
    ///
    /// Replaces any previous conversion under the same name, including the
    /// built-in `bool`, `char` and `enum` ones.
    pub fn register_conversion(
        &mut self,
        name: impl Into<String>,
        conversion: Arc<dyn NativeConversion>,
    ) {
        self.conversions.insert(name.into(), conversion);
    }

    /// Builder form of [`register_conversion`](Self::register_conversion)
    pub fn with_conversion(
        mut self,
        name: impl Into<String>,
        conversion: Arc<dyn NativeConversion>,
    ) -> Self {
        self.register_conversion(name, conversion);
        self
    }

    /// Pin the style of named type `name`
    pub fn override_style(&mut self, name: impl Into<String>, style: StyleOverride) {
        self.overrides.insert(name.into(), style);
    }

    /// Builder form of [`override_style`](Self::override_style)
    pub fn with_override(mut self, name: impl Into<String>, style: StyleOverride) -> Self {
        self.override_style(name, style);
        self
    }

    /// Native conversion for `desc`, if it needs one and one is registered
    pub fn conversion_for(&self, desc: &TypeDesc) -> Option<Arc<dyn NativeConversion>> {
        conversion_key(desc).and_then(|key| self.conversions.get(key).cloned())
    }

    /// Codec ids in the order they are consulted
    pub fn codec_ids(&self) -> Vec<&str> {
        self.codecs().map(|c| c.id()).collect()
    }

    fn codecs(&self) -> impl Iterator<Item = &Arc<dyn StyleCodec>> {
        self.user_codecs.iter().chain(self.builtins.iter())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Storage style for `desc` under `options`
    ///
    /// Side-effect free and deterministic.
    pub fn resolve(&self, desc: &TypeDesc, options: &VectorOptions) -> Result<StorageStyle> {
        if let Some(pinned) = desc.named().and_then(|name| self.overrides.get(name)) {
            return self.resolve_override(*pinned, desc, options);
        }
        for codec in self.codecs() {
            if let Some(style) = codec.resolve(desc, options, self)? {
                return Ok(style);
            }
        }
        Err(Error::resolution(
            desc.type_name(),
            "no storage style accepts this type",
        ))
    }

    fn resolve_override(
        &self,
        pinned: StyleOverride,
        desc: &TypeDesc,
        options: &VectorOptions,
    ) -> Result<StorageStyle> {
        let style = match pinned {
            StyleOverride::Composite => CompositeCodec.resolve(desc, options, self)?,
            StyleOverride::Json if self.json => Some(StorageStyle::TextSerialized),
            StyleOverride::Serialized | StyleOverride::Json => {
                SerializedCodec::bytes().resolve(desc, options, self)?
            }
        };
        style.ok_or_else(|| {
            Error::resolution(
                desc.type_name(),
                format!("type cannot be stored with its {:?} override", pinned),
            )
        })
    }

    /// Codec that builds vectors of `style`
    pub fn codec_for(&self, style: &StorageStyle) -> Result<Arc<dyn StyleCodec>> {
        self.codecs()
            .find(|c| c.handles(style))
            .cloned()
            .ok_or_else(|| Error::Metadata(format!("no codec registered for style {}", style)))
    }

    // =========================================================================
    // Create / load
    // =========================================================================

    /// Create an empty vector `name` under `parent`
    ///
    /// Fails with a resolution error before anything is written if the type
    /// has no storage style. If building the layout fails after the group
    /// was created, the group is removed again.
    pub fn create(
        &self,
        parent: &Group,
        name: &str,
        desc: &TypeDesc,
        options: &VectorOptions,
    ) -> Result<DynVector> {
        options.validate()?;
        let style = self.resolve(desc, options)?;
        let codec = self.codec_for(&style)?;

        let group = parent.create_group(name)?;
        let built = MetadataRecord::new(desc, options, &style)
            .write(&group)
            .and_then(|()| {
                let ctx = VectorContext::new(self, &group, desc, options);
                codec.create(&ctx, &style)
            });
        let inner = match built {
            Ok(inner) => inner,
            Err(e) => {
                if let Err(cleanup) = parent.remove(name) {
                    warn!(
                        target: "chunkvec::vector",
                        path = group.path(),
                        error = %cleanup,
                        "Failed to remove partially created vector"
                    );
                }
                return Err(e);
            }
        };

        debug!(
            target: "chunkvec::vector",
            path = group.path(),
            type_name = %desc.type_name(),
            style = %style,
            "Created vector"
        );
        Ok(DynVector::new(
            group,
            desc.clone(),
            style,
            options.clone(),
            inner,
        ))
    }

    /// Reopen the vector stored at `group`, type taken from its metadata
    pub fn load(&self, group: &Group) -> Result<DynVector> {
        let record = MetadataRecord::read(group)?;
        let desc = record.descriptor.clone();
        self.attach(group, desc, &record)
    }

    /// Reopen the vector stored at `group` as type `desc`
    ///
    /// The persisted type must equal `desc`.
    pub fn load_as(&self, group: &Group, desc: &TypeDesc) -> Result<DynVector> {
        let record = MetadataRecord::read(group)?;
        if record.descriptor != *desc {
            return Err(Error::type_mismatch(desc.type_name(), record.type_name));
        }
        self.attach(group, desc.clone(), &record)
    }

    fn attach(&self, group: &Group, desc: TypeDesc, record: &MetadataRecord) -> Result<DynVector> {
        let options = record.options();
        let style = self.resolve(&desc, &options)?;
        if style.tag() != record.style_tag {
            return Err(Error::Metadata(format!(
                "{} was stored as {} but now resolves to {}",
                group.path(),
                record.style_tag,
                style.tag()
            )));
        }
        let codec = self.codec_for(&style)?;
        let inner = {
            let ctx = VectorContext::new(self, group, &desc, &options);
            codec.load(&ctx, &style)?
        };

        debug!(
            target: "chunkvec::vector",
            path = group.path(),
            style = %style,
            len = inner.len(),
            "Loaded vector"
        );
        Ok(DynVector::new(group.clone(), desc, style, options, inner))
    }

    /// Create a vector and push every value of `values` into it
    pub fn copy_into(
        &self,
        parent: &Group,
        name: &str,
        desc: &TypeDesc,
        values: Vec<Value>,
        options: &VectorOptions,
    ) -> Result<DynVector> {
        let mut vector = self.create(parent, name, desc, options)?;
        vector.push_many(values)?;
        Ok(vector)
    }
}

impl Default for VectorRegistry {
    fn default() -> Self {
        VectorRegistry::standard()
    }
}

impl fmt::Debug for VectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut conversions: Vec<&str> = self.conversions.keys().map(String::as_str).collect();
        conversions.sort_unstable();
        f.debug_struct("VectorRegistry")
            .field("codecs", &self.codec_ids())
            .field("conversions", &conversions)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Process-wide standard registry
static STANDARD: Lazy<VectorRegistry> = Lazy::new(VectorRegistry::standard);

/// The shared registry with the built-in styles and conversions only
pub fn standard_registry() -> &'static VectorRegistry {
    &STANDARD
}
