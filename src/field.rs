//! Field model.
//!
//! A [`Field`] is a handle to a declared scalar or enumerated value. Handles
//! are cheap to clone and compare by identity: two handles are equal iff
//! they refer to the same declaration. A field's type is fixed when it is
//! declared; it becomes usable by the solver once it is bound to a
//! [`Model`][crate::model::Model], which gives it a name and a [`FieldId`].

use std::cell::{Cell, OnceCell};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::domain::{EnumDomain, EnumValue};
use crate::error::{DomainError, Error, Result};

/// Widest field the model supports.
pub const MAX_WIDTH: u32 = 64;

/// Stable identity of a bound field, in bind order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldId(u32);

impl FieldId {
    pub fn new(id: u32) -> Self {
        FieldId(id)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl Display for FieldId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar { width: u32, signed: bool },
    Enum(Rc<EnumDomain>),
}

impl FieldType {
    pub fn unsigned(width: u32) -> Self {
        FieldType::Scalar {
            width,
            signed: false,
        }
    }

    pub fn signed(width: u32) -> Self {
        FieldType::Scalar { width, signed: true }
    }

    pub fn width(&self) -> u32 {
        match self {
            FieldType::Scalar { width, .. } => *width,
            FieldType::Enum(domain) => domain.width(),
        }
    }

    pub fn is_signed(&self) -> bool {
        match self {
            FieldType::Scalar { signed, .. } => *signed,
            FieldType::Enum(domain) => domain.is_signed(),
        }
    }

    pub fn domain(&self) -> Option<&Rc<EnumDomain>> {
        match self {
            FieldType::Scalar { .. } => None,
            FieldType::Enum(domain) => Some(domain),
        }
    }
}

/// The value of a field: an integer, or a member of the field's domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Enum(EnumValue),
}

impl Value {
    /// Numeric value, using the encoded value for enum members.
    pub fn as_int(&self) -> i128 {
        match self {
            Value::Int(v) => *v,
            Value::Enum(e) => i128::from(e.value()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Enum(e) => write!(f, "{}", e),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(value.into())
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Value::Int(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<&EnumValue> for Value {
    fn from(value: &EnumValue) -> Self {
        Value::Enum(value.clone())
    }
}

#[derive(Debug)]
struct Binding {
    id: FieldId,
    name: String,
}

struct FieldSlot {
    ty: FieldType,
    is_random: Cell<bool>,
    /// Raw two's complement bits, always within `ty.width()`.
    raw: Cell<u64>,
    binding: OnceCell<Binding>,
}

#[derive(Clone)]
pub struct Field {
    slot: Rc<FieldSlot>,
}

impl Field {
    /// Declare a field. It stays unbound until a model binds it.
    pub fn new(ty: FieldType, is_random: bool) -> Result<Self> {
        let width = ty.width();
        if width == 0 || width > MAX_WIDTH {
            return Err(Error::WidthMismatch(format!(
                "field width {} is outside 1..={}",
                width, MAX_WIDTH
            )));
        }
        let raw = match ty.domain() {
            Some(domain) => {
                let first = domain.values().next().unwrap_or(0);
                encode(first.into(), width, domain.is_signed()).unwrap_or(0)
            }
            None => 0,
        };
        Ok(Self {
            slot: Rc::new(FieldSlot {
                ty,
                is_random: Cell::new(is_random),
                raw: Cell::new(raw),
                binding: OnceCell::new(),
            }),
        })
    }

    /// Unsigned non-random field of the given width.
    pub fn bit(width: u32) -> Result<Self> {
        Self::new(FieldType::unsigned(width), false)
    }

    /// Signed non-random field of the given width.
    pub fn int(width: u32) -> Result<Self> {
        Self::new(FieldType::signed(width), false)
    }

    pub fn rand_bit(width: u32) -> Result<Self> {
        Self::new(FieldType::unsigned(width), true)
    }

    pub fn rand_int(width: u32) -> Result<Self> {
        Self::new(FieldType::signed(width), true)
    }

    pub fn enumeration(domain: &Rc<EnumDomain>, is_random: bool) -> Result<Self> {
        Self::new(FieldType::Enum(Rc::clone(domain)), is_random)
    }

    pub(crate) fn bind(&self, id: FieldId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.slot.binding.get() {
            return Err(Error::AlreadyBound(existing.name.clone()));
        }
        log::debug!("bind {} as {}: {:?}", name, id, self.slot.ty);
        self.slot
            .binding
            .set(Binding { id, name })
            .map_err(|b| Error::AlreadyBound(b.name))
    }

    pub fn is_bound(&self) -> bool {
        self.slot.binding.get().is_some()
    }

    pub fn id(&self) -> Option<FieldId> {
        self.slot.binding.get().map(|b| b.id)
    }

    pub fn name(&self) -> Option<&str> {
        self.slot.binding.get().map(|b| b.name.as_str())
    }

    pub fn ty(&self) -> &FieldType {
        &self.slot.ty
    }

    pub fn width(&self) -> u32 {
        self.slot.ty.width()
    }

    pub fn is_signed(&self) -> bool {
        self.slot.ty.is_signed()
    }

    pub fn domain(&self) -> Option<&Rc<EnumDomain>> {
        self.slot.ty.domain()
    }

    pub fn is_random(&self) -> bool {
        self.slot.is_random.get()
    }

    pub fn set_random(&self, is_random: bool) {
        self.slot.is_random.set(is_random);
    }

    /// Current value. Enumerated fields report their domain member.
    pub fn get_value(&self) -> Value {
        let value = self.get_int();
        match self.domain() {
            Some(domain) => match domain.from_value(value) {
                Ok(member) => Value::Enum(member),
                Err(_) => Value::Int(value),
            },
            None => Value::Int(value),
        }
    }

    /// Current value as an integer, sign-extended for signed fields.
    pub fn get_int(&self) -> i128 {
        decode(self.slot.raw.get(), self.width(), self.is_signed())
    }

    /// Set the current value.
    ///
    /// Values that do not fit the field's width are rejected rather than
    /// truncated. Enumerated fields only accept members of their domain, or
    /// integers equal to the encoding of one.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if let Some(domain) = self.domain() {
            let member = match value {
                Value::Enum(member) if Rc::ptr_eq(member.domain(), domain) => member,
                Value::Enum(member) => {
                    return Err(DomainError::NotAMember {
                        domain: domain.name().to_string(),
                        value: member.to_string(),
                    }
                    .into())
                }
                Value::Int(v) => domain.from_value(v)?,
            };
            self.slot.raw.set(self.encode_checked(member.value().into())?);
            return Ok(());
        }
        self.slot.raw.set(self.encode_checked(value.as_int())?);
        Ok(())
    }

    fn encode_checked(&self, value: i128) -> Result<u64> {
        encode(value, self.width(), self.is_signed()).ok_or(Error::ValueOutOfRange {
            value,
            width: self.width(),
            signed: self.is_signed(),
        })
    }

    /// Current value as raw two's complement bits.
    pub fn raw_value(&self) -> u64 {
        self.slot.raw.get()
    }

    /// Store raw bits coming back from the solver.
    pub(crate) fn set_raw(&self, raw: u64) {
        self.slot.raw.set(raw & mask(self.width()));
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.slot).hash(state);
    }
}

impl Debug for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("binding", &self.slot.binding.get())
            .field("ty", &self.slot.ty)
            .field("is_random", &self.is_random())
            .field("value", &self.get_int())
            .finish()
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<unbound>"),
        }
    }
}

pub(crate) fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Two's complement encoding of `value` in `width` bits, if it fits.
pub(crate) fn encode(value: i128, width: u32, signed: bool) -> Option<u64> {
    let (min, max) = if signed {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    } else {
        (0, (1i128 << width) - 1)
    };
    if value < min || value > max {
        return None;
    }
    Some((value as u64) & mask(width))
}

/// Inverse of [`encode`].
pub(crate) fn decode(raw: u64, width: u32, signed: bool) -> i128 {
    let raw = raw & mask(width);
    if signed && width > 0 && (raw >> (width - 1)) & 1 == 1 {
        i128::from(raw) - (1i128 << width)
    } else {
        i128::from(raw)
    }
}
