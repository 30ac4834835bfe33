//! Structural type system.
//!
//! Types live in a per-program [`TypeStore`], a deduplicating arena: two
//! structurally equal [`Type`] values intern to the same [`Handle`], so
//! handle identity is type equality once interned. Child types are
//! referenced by handle, which makes equality recursive for free.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::arena::{Arena, Handle};
use crate::symbol::{Symbol, SymbolTable};

/// A scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Scalar {
    Bool,
    I32,
    U32,
    F32,
}

impl Scalar {
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I32 | Self::U32)
    }

    pub fn is_float(self) -> bool {
        self == Self::F32
    }

    pub fn is_numeric(self) -> bool {
        self != Self::Bool
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::F32 => "f32",
        }
    }
}

/// Number of components in a vector, or columns/rows of a matrix.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum VectorSize {
    Bi = 2,
    Tri = 3,
    Quad = 4,
}

impl VectorSize {
    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            2 => Some(Self::Bi),
            3 => Some(Self::Tri),
            4 => Some(Self::Quad),
            _ => None,
        }
    }

    pub fn count(self) -> u32 {
        self as u32
    }
}

/// Storage class of a variable or pointer.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum AddressSpace {
    Function,
    Private,
    Workgroup,
    Uniform,
    Storage,
    /// Opaque resources (samplers, textures).
    Handle,
}

impl AddressSpace {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "function" => Self::Function,
            "private" => Self::Private,
            "workgroup" => Self::Workgroup,
            "uniform" => Self::Uniform,
            "storage" => Self::Storage,
            _ => return None,
        })
    }

    /// Access mode used when a declaration does not spell one out.
    pub fn default_access(self) -> Access {
        match self {
            Self::Uniform | Self::Storage | Self::Handle => Access::Read,
            Self::Function | Self::Private | Self::Workgroup => Access::ReadWrite,
        }
    }
}

/// Memory access mode.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "read" => Self::Read,
            "write" => Self::Write,
            "read_write" => Self::ReadWrite,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum SamplerKind {
    Sampler,
    Comparison,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TextureDimension {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
    CubeArray,
}

macro_rules! image_formats {
    ($($variant:ident => $name:literal,)*) => {
        /// Texel format of a storage texture.
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
        pub enum ImageFormat {
            $($variant,)*
        }

        impl ImageFormat {
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

image_formats! {
    R8Unorm => "r8unorm",
    R8Snorm => "r8snorm",
    R8Uint => "r8uint",
    R8Sint => "r8sint",
    R16Uint => "r16uint",
    R16Sint => "r16sint",
    R16Float => "r16float",
    Rg8Unorm => "rg8unorm",
    Rg8Snorm => "rg8snorm",
    Rg8Uint => "rg8uint",
    Rg8Sint => "rg8sint",
    R32Uint => "r32uint",
    R32Sint => "r32sint",
    R32Float => "r32float",
    Rg16Uint => "rg16uint",
    Rg16Sint => "rg16sint",
    Rg16Float => "rg16float",
    Rgba8Unorm => "rgba8unorm",
    Rgba8UnormSrgb => "rgba8unorm_srgb",
    Rgba8Snorm => "rgba8snorm",
    Rgba8Uint => "rgba8uint",
    Rgba8Sint => "rgba8sint",
    Bgra8Unorm => "bgra8unorm",
    Bgra8UnormSrgb => "bgra8unorm_srgb",
    Rgb10A2Unorm => "rgb10a2unorm",
    Rg11B10Float => "rg11b10float",
    Rg32Uint => "rg32uint",
    Rg32Sint => "rg32sint",
    Rg32Float => "rg32float",
    Rgba16Uint => "rgba16uint",
    Rgba16Sint => "rgba16sint",
    Rgba16Float => "rgba16float",
    Rgba32Uint => "rgba32uint",
    Rgba32Sint => "rgba32sint",
    Rgba32Float => "rgba32float",
}

/// What a texture holds and how it is accessed.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TextureKind {
    Sampled(Handle<Type>),
    Multisampled(Handle<Type>),
    Depth,
    Storage { format: ImageFormat, access: Access },
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TextureType {
    pub dim: TextureDimension,
    pub kind: TextureKind,
}

/// A fixed-size or runtime-sized array with its memory layout.
///
/// `implicit_stride` is the element stride the default layout would use.
/// It is a display hint only: equality and hashing ignore it, so an array
/// whose explicit stride happens to equal the natural one is the same type
/// as the default-layout array.
#[derive(Clone, Copy, Debug)]
pub struct ArrayType {
    pub elem: Handle<Type>,
    /// Element count; `0` marks a runtime-sized array.
    pub count: u32,
    pub align: u32,
    pub size: u32,
    pub stride: u32,
    pub implicit_stride: u32,
}

impl ArrayType {
    pub fn is_runtime_sized(&self) -> bool {
        self.count == 0
    }

    pub fn is_stride_implicit(&self) -> bool {
        self.stride == self.implicit_stride
    }
}

impl PartialEq for ArrayType {
    fn eq(&self, other: &Self) -> bool {
        self.elem == other.elem
            && self.count == other.count
            && self.align == other.align
            && self.size == other.size
            && self.stride == other.stride
    }
}

impl Eq for ArrayType {}

impl Hash for ArrayType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elem.hash(state);
        self.count.hash(state);
        self.align.hash(state);
        self.size.hash(state);
        self.stride.hash(state);
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct StructMember {
    pub name: Symbol,
    pub ty: Handle<Type>,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

/// A nominal structure type: the name takes part in equality.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct StructType {
    pub name: Symbol,
    pub members: Vec<StructMember>,
    pub size: u32,
    pub align: u32,
}

impl StructType {
    pub fn member(&self, name: Symbol) -> Option<(usize, &StructMember)> {
        self.members.iter().enumerate().find(|(_, m)| m.name == name)
    }
}

/// A resolved type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Type {
    Scalar(Scalar),
    Vector {
        size: VectorSize,
        scalar: Scalar,
    },
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        scalar: Scalar,
    },
    Atomic(Scalar),
    Pointer {
        pointee: Handle<Type>,
        space: AddressSpace,
        access: Access,
    },
    Array(ArrayType),
    Sampler(SamplerKind),
    Texture(TextureType),
    Struct(StructType),
}

/// Size and alignment in bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    pub size: u32,
    pub align: u32,
}

/// Rounds `value` up to a multiple of `align` (`align == 0` leaves it).
pub fn round_up(align: u32, value: u32) -> u32 {
    if align == 0 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

fn vector_layout(size: VectorSize) -> Layout {
    match size {
        VectorSize::Bi => Layout { size: 8, align: 8 },
        VectorSize::Tri => Layout { size: 12, align: 16 },
        VectorSize::Quad => Layout { size: 16, align: 16 },
    }
}

/// The per-program type store.
///
/// Types are hash-consed: structurally equal descriptors share one handle,
/// so handle equality is type equality.
#[derive(Clone, Debug, Default)]
pub struct TypeStore {
    types: Arena<Type>,
    interned: HashMap<Type, Handle<Type>>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `ty`. Idempotent: equal descriptors return the same handle.
    pub fn intern(&mut self, ty: Type) -> Handle<Type> {
        if let Some(&existing) = self.interned.get(&ty) {
            return existing;
        }
        let handle = self.types.append(ty.clone());
        self.interned.insert(ty, handle);
        handle
    }

    /// Returns the handle of an already-interned equal type.
    pub fn lookup(&self, ty: &Type) -> Option<Handle<Type>> {
        self.interned.get(ty).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<Type>, &Type)> {
        self.types.iter()
    }

    pub fn scalar(&mut self, scalar: Scalar) -> Handle<Type> {
        self.intern(Type::Scalar(scalar))
    }

    pub fn vector(&mut self, size: VectorSize, scalar: Scalar) -> Handle<Type> {
        self.intern(Type::Vector { size, scalar })
    }

    pub fn matrix(&mut self, columns: VectorSize, rows: VectorSize, scalar: Scalar) -> Handle<Type> {
        self.intern(Type::Matrix {
            columns,
            rows,
            scalar,
        })
    }

    pub fn pointer(&mut self, pointee: Handle<Type>, space: AddressSpace, access: Access) -> Handle<Type> {
        self.intern(Type::Pointer {
            pointee,
            space,
            access,
        })
    }

    /// Interns an array of `count` elements (`0` = runtime sized) laid out
    /// with the natural stride, or `explicit_stride` when given.
    pub fn array(&mut self, elem: Handle<Type>, count: u32, explicit_stride: Option<u32>) -> Handle<Type> {
        let elem_layout = self.layout(elem);
        let implicit_stride = round_up(elem_layout.align, elem_layout.size);
        let stride = explicit_stride.unwrap_or(implicit_stride);
        let size = if count == 0 {
            stride
        } else {
            count.saturating_mul(stride)
        };
        self.intern(Type::Array(ArrayType {
            elem,
            count,
            align: elem_layout.align,
            size,
            stride,
            implicit_stride,
        }))
    }

    /// Interns a structure, assigning member offsets with the natural layout.
    pub fn structure(&mut self, name: Symbol, members: &[(Symbol, Handle<Type>)]) -> Handle<Type> {
        let mut offset = 0u32;
        let mut struct_align = 1u32;
        let mut laid_out = Vec::with_capacity(members.len());
        for &(member_name, ty) in members {
            let layout = self.layout(ty);
            offset = round_up(layout.align, offset);
            laid_out.push(StructMember {
                name: member_name,
                ty,
                offset,
                size: layout.size,
                align: layout.align,
            });
            offset = offset.saturating_add(layout.size);
            struct_align = struct_align.max(layout.align);
        }
        self.intern(Type::Struct(StructType {
            name,
            members: laid_out,
            size: round_up(struct_align, offset),
            align: struct_align,
        }))
    }

    /// Natural size and alignment of `ty`. Opaque types report zero.
    pub fn layout(&self, ty: Handle<Type>) -> Layout {
        match &self[ty] {
            Type::Scalar(_) | Type::Atomic(_) => Layout { size: 4, align: 4 },
            Type::Vector { size, .. } => vector_layout(*size),
            Type::Matrix { columns, rows, .. } => {
                let column = vector_layout(*rows);
                Layout {
                    size: columns.count() * round_up(column.align, column.size),
                    align: column.align,
                }
            }
            Type::Array(array) => Layout {
                size: array.size,
                align: array.align,
            },
            Type::Struct(s) => Layout {
                size: s.size,
                align: s.align,
            },
            Type::Pointer { .. } | Type::Sampler(_) | Type::Texture(_) => Layout { size: 0, align: 0 },
        }
    }

    /// The scalar of a scalar, vector, matrix or atomic type.
    pub fn scalar_of(&self, ty: Handle<Type>) -> Option<Scalar> {
        match self[ty] {
            Type::Scalar(s) | Type::Atomic(s) => Some(s),
            Type::Vector { scalar, .. } | Type::Matrix { scalar, .. } => Some(scalar),
            _ => None,
        }
    }

    /// Strips one level of pointer indirection.
    pub fn unwrap_pointer(&self, ty: Handle<Type>) -> Handle<Type> {
        match self[ty] {
            Type::Pointer { pointee, .. } => pointee,
            _ => ty,
        }
    }

    /// The type as it is written in source, for diagnostics.
    pub fn friendly_name(&self, ty: Handle<Type>, symbols: &SymbolTable) -> String {
        match &self[ty] {
            Type::Scalar(s) => s.as_str().to_owned(),
            Type::Vector { size, scalar } => format!("vec{}<{}>", size.count(), scalar.as_str()),
            Type::Matrix {
                columns,
                rows,
                scalar,
            } => format!("mat{}x{}<{}>", columns.count(), rows.count(), scalar.as_str()),
            Type::Atomic(s) => format!("atomic<{}>", s.as_str()),
            Type::Pointer {
                pointee,
                space,
                access,
            } => {
                let pointee = self.friendly_name(*pointee, symbols);
                if *space == AddressSpace::Storage {
                    format!("ptr<{space}, {pointee}, {access}>")
                } else {
                    format!("ptr<{space}, {pointee}>")
                }
            }
            Type::Array(array) => {
                let mut out = String::new();
                if !array.is_stride_implicit() {
                    out.push_str(&format!("@stride({}) ", array.stride));
                }
                out.push_str("array<");
                out.push_str(&self.friendly_name(array.elem, symbols));
                if !array.is_runtime_sized() {
                    out.push_str(&format!(", {}", array.count));
                }
                out.push('>');
                out
            }
            Type::Sampler(SamplerKind::Sampler) => "sampler".to_owned(),
            Type::Sampler(SamplerKind::Comparison) => "sampler_comparison".to_owned(),
            Type::Texture(TextureType { dim, kind }) => match kind {
                TextureKind::Sampled(elem) => {
                    format!("texture_{dim}<{}>", self.friendly_name(*elem, symbols))
                }
                TextureKind::Multisampled(elem) => {
                    format!("texture_multisampled_{dim}<{}>", self.friendly_name(*elem, symbols))
                }
                TextureKind::Depth => format!("texture_depth_{dim}"),
                TextureKind::Storage { format, access } => {
                    format!("texture_storage_{dim}<{}, {access}>", format.as_str())
                }
            },
            Type::Struct(s) => symbols.name_for(s.name).to_owned(),
        }
    }

    /// The mangled internal name, unique per structural type.
    pub fn type_name(&self, ty: Handle<Type>, symbols: &SymbolTable) -> String {
        match &self[ty] {
            Type::Scalar(s) => format!("__{}", s.as_str()),
            Type::Vector { size, scalar } => format!("__vec_{}__{}", size.count(), scalar.as_str()),
            Type::Matrix {
                columns,
                rows,
                scalar,
            } => format!("__mat_{}_{}__{}", columns.count(), rows.count(), scalar.as_str()),
            Type::Atomic(s) => format!("__atomic__{}", s.as_str()),
            Type::Pointer {
                pointee,
                space,
                access,
            } => format!("__ptr_{space}_{access}{}", self.type_name(*pointee, symbols)),
            Type::Array(array) => format!(
                "__array{}_count_{}_align_{}_size_{}_stride_{}",
                self.type_name(array.elem, symbols),
                array.count,
                array.align,
                array.size,
                array.stride
            ),
            Type::Sampler(SamplerKind::Sampler) => "__sampler_sampler".to_owned(),
            Type::Sampler(SamplerKind::Comparison) => "__sampler_comparison".to_owned(),
            Type::Texture(TextureType { dim, kind }) => match kind {
                TextureKind::Sampled(elem) => {
                    format!("__sampled_texture_{dim}{}", self.type_name(*elem, symbols))
                }
                TextureKind::Multisampled(elem) => {
                    format!("__multisampled_texture_{dim}{}", self.type_name(*elem, symbols))
                }
                TextureKind::Depth => format!("__depth_texture_{dim}"),
                TextureKind::Storage { format, access } => {
                    format!("__storage_texture_{dim}_{}_{access}", format.as_str())
                }
            },
            Type::Struct(s) => format!("__struct_{}", symbols.name_for(s.name)),
        }
    }
}

impl Index<Handle<Type>> for TypeStore {
    type Output = Type;

    fn index(&self, handle: Handle<Type>) -> &Type {
        &self.types[handle]
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Function => "function",
            Self::Private => "private",
            Self::Workgroup => "workgroup",
            Self::Uniform => "uniform",
            Self::Storage => "storage",
            Self::Handle => "handle",
        })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read_write",
        })
    }
}

impl fmt::Display for TextureDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::D1 => "1d",
            Self::D2 => "2d",
            Self::D2Array => "2d_array",
            Self::D3 => "3d",
            Self::Cube => "cube",
            Self::CubeArray => "cube_array",
        })
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of(ty: &Type) -> u64 {
        let mut hasher = DefaultHasher::new();
        ty.hash(&mut hasher);
        hasher.finish()
    }

    fn raw_array(elem: Handle<Type>, count: u32, align: u32, size: u32, stride: u32, implicit: u32) -> Type {
        Type::Array(ArrayType {
            elem,
            count,
            align,
            size,
            stride,
            implicit_stride: implicit,
        })
    }

    #[test]
    fn interning_is_idempotent() {
        let mut types = TypeStore::new();
        let a = types.vector(VectorSize::Tri, Scalar::F32);
        let b = types.intern(Type::Vector {
            size: VectorSize::Tri,
            scalar: Scalar::F32,
        });
        assert_eq!(a, b);
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn sized_array_reports_explicit_stride() {
        let mut types = TypeStore::new();
        let u32_ty = types.scalar(Scalar::U32);
        let h = types.intern(raw_array(u32_ty, 2, 4, 8, 32, 16));
        let Type::Array(arr) = types[h] else {
            panic!("expected Array");
        };
        assert_eq!(arr.elem, u32_ty);
        assert_eq!(arr.count, 2);
        assert_eq!(arr.align, 4);
        assert_eq!(arr.size, 8);
        assert_eq!(arr.stride, 32);
        assert_eq!(arr.implicit_stride, 16);
        assert!(!arr.is_stride_implicit());
        assert!(!arr.is_runtime_sized());
    }

    #[test]
    fn runtime_array_reports_implicit_stride() {
        let mut types = TypeStore::new();
        let u32_ty = types.scalar(Scalar::U32);
        let h = types.intern(raw_array(u32_ty, 0, 4, 8, 32, 32));
        let Type::Array(arr) = types[h] else {
            panic!("expected Array");
        };
        assert!(arr.is_stride_implicit());
        assert!(arr.is_runtime_sized());
    }

    #[test]
    fn array_equality_ignores_implicit_stride() {
        let mut types = TypeStore::new();
        let i32_ty = types.scalar(Scalar::I32);
        let a = raw_array(i32_ty, 4, 4, 32, 8, 4);
        let b = raw_array(i32_ty, 4, 4, 32, 8, 8);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        let ha = types.intern(a);
        let hb = types.intern(b);
        assert_eq!(ha, hb);

        let c = raw_array(i32_ty, 4, 4, 32, 16, 4);
        assert_ne!(types.intern(c), ha);
    }

    #[test]
    fn friendly_names_of_arrays() {
        let mut types = TypeStore::new();
        let symbols = SymbolTable::new();
        let i32_ty = types.scalar(Scalar::I32);

        let runtime = types.intern(raw_array(i32_ty, 0, 0, 4, 4, 4));
        assert_eq!(types.friendly_name(runtime, &symbols), "array<i32>");

        let sized = types.intern(raw_array(i32_ty, 5, 4, 20, 4, 4));
        assert_eq!(types.friendly_name(sized, &symbols), "array<i32, 5>");

        let strided = types.intern(raw_array(i32_ty, 0, 0, 4, 8, 4));
        assert_eq!(types.friendly_name(strided, &symbols), "@stride(8) array<i32>");

        let strided_sized = types.intern(raw_array(i32_ty, 5, 4, 20, 8, 4));
        assert_eq!(
            types.friendly_name(strided_sized, &symbols),
            "@stride(8) array<i32, 5>"
        );
    }

    #[test]
    fn mangled_array_names() {
        let mut types = TypeStore::new();
        let symbols = SymbolTable::new();
        let i32_ty = types.scalar(Scalar::I32);
        let arr = types.intern(raw_array(i32_ty, 2, 0, 4, 4, 4));
        assert_eq!(
            types.type_name(arr, &symbols),
            "__array__i32_count_2_align_0_size_4_stride_4"
        );
    }

    #[test]
    fn sampler_kinds_are_distinct() {
        let mut types = TypeStore::new();
        let symbols = SymbolTable::new();
        let plain = types.intern(Type::Sampler(SamplerKind::Sampler));
        let cmp = types.intern(Type::Sampler(SamplerKind::Comparison));
        assert_ne!(plain, cmp);
        assert_eq!(types.friendly_name(cmp, &symbols), "sampler_comparison");
        assert_eq!(types.type_name(cmp, &symbols), "__sampler_comparison");
    }

    #[test]
    fn natural_array_layout() {
        let mut types = TypeStore::new();
        let v3 = types.vector(VectorSize::Tri, Scalar::F32);
        let arr = types.array(v3, 4, None);
        let Type::Array(a) = types[arr] else {
            panic!("expected Array");
        };
        assert_eq!(a.stride, 16);
        assert_eq!(a.size, 64);
        assert!(a.is_stride_implicit());

        let strided = types.array(v3, 4, Some(32));
        assert_ne!(arr, strided);
    }

    #[test]
    fn struct_layout_rounds_offsets() {
        let mut types = TypeStore::new();
        let mut symbols = SymbolTable::new();
        let f32_ty = types.scalar(Scalar::F32);
        let v3 = types.vector(VectorSize::Tri, Scalar::F32);
        let name = symbols.register("Light");
        let a = symbols.register("intensity");
        let b = symbols.register("dir");
        let s = types.structure(name, &[(a, f32_ty), (b, v3)]);
        let Type::Struct(st) = &types[s] else {
            panic!("expected Struct");
        };
        assert_eq!(st.members[0].offset, 0);
        assert_eq!(st.members[1].offset, 16);
        assert_eq!(st.size, 32);
        assert_eq!(st.align, 16);
        assert_eq!(types.friendly_name(s, &symbols), "Light");
    }

    #[test]
    fn storage_texture_names() {
        let mut types = TypeStore::new();
        let symbols = SymbolTable::new();
        let tex = types.intern(Type::Texture(TextureType {
            dim: TextureDimension::D2Array,
            kind: TextureKind::Storage {
                format: ImageFormat::Rgba8Unorm,
                access: Access::Write,
            },
        }));
        assert_eq!(
            types.friendly_name(tex, &symbols),
            "texture_storage_2d_array<rgba8unorm, write>"
        );
        assert_eq!(ImageFormat::parse("r16float"), Some(ImageFormat::R16Float));
        assert_eq!(ImageFormat::parse("abc"), None);
    }
}
