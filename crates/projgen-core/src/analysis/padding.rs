//! # Padding Analysis
//!
//! Measures how many bytes of a native type are padding, using the same
//! symbol data the generator consumes.
//!
//! Members are the type's instance fields and its direct bases. A member's
//! padding is the gap between its end and the start of the next member (or
//! the end of the type), never negative, plus the padding inside the
//! member's own type. Bases are listed first, then everything by offset.
//!
//! ## Example
//!
//! ```rust
//! use projgen_core::analysis::PaddingAnalyzer;
//! use projgen_core::symbols::TypeTableBuilder;
//! use projgen_core::types::{FieldDescriptor, NativeBaseType, TypeDescriptor};
//!
//! let mut builder = TypeTableBuilder::new();
//! let ch = builder.add(TypeDescriptor::basic("char", NativeBaseType::Char, 1));
//! let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
//! let s = builder.add(
//!     TypeDescriptor::structure("S", 8)
//!         .with_field(FieldDescriptor::new("c", ch, 0, 1))
//!         .with_field(FieldDescriptor::new("i", int, 4, 4)),
//! );
//! let table = builder.build()?;
//!
//! let mut analyzer = PaddingAnalyzer::new(&table);
//! let report = analyzer.analyze(s)?;
//! assert_eq!(report.total_padding, 3);
//! assert_eq!(report.members[0].padding, 3);
//! # Ok::<(), projgen_core::error::GenError>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::error::{GenError, Result};
use crate::symbols::TypeTable;
use crate::types::{TypeId, TypeTag};

/// One field or base class of an analyzed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLayout
{
    /// Field name, or `Base: <type>` for base classes
    pub name: String,
    pub type_name: String,
    pub offset: u64,
    pub size: u64,
    /// Trailing gap plus the member type's own padding
    pub padding: u64,
    pub is_base: bool,
}

/// Padding breakdown of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingReport
{
    pub id: TypeId,
    pub type_name: String,
    pub size: u64,
    pub members: Vec<MemberLayout>,
    pub total_padding: u64,
}

/// A row of a cache-line layout listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutRow
{
    Member(MemberLayout),
    Padding
    {
        offset: u64,
        size: u64,
    },
    CacheLineBoundary
    {
        offset: u64,
    },
}

impl PaddingReport
{
    /// Fraction of the type that is padding.
    pub fn padding_ratio(&self) -> f64
    {
        if self.size == 0 {
            0.0
        } else {
            self.total_padding as f64 / self.size as f64
        }
    }

    /// Members interleaved with cache-line boundaries and padding rows.
    ///
    /// Cache lines are counted from `prefetch_start` (clamped to the type
    /// size); a boundary row is emitted before each member that starts at
    /// least one line past the previous boundary. A `cache_line` of 0
    /// disables boundary rows.
    pub fn rows(&self, cache_line: u64, prefetch_start: u64) -> Vec<LayoutRow>
    {
        let mut rows = Vec::with_capacity(self.members.len() * 2);
        let mut previous_boundary = prefetch_start.min(self.size);
        let mut lines = 0u64;

        for member in &self.members {
            if cache_line > 0 {
                while member.offset.saturating_sub(previous_boundary) >= cache_line {
                    lines += 1;
                    let boundary = lines
                        .saturating_mul(cache_line)
                        .saturating_add(prefetch_start);
                    rows.push(LayoutRow::CacheLineBoundary { offset: boundary });
                    previous_boundary = boundary;
                }
            }
            rows.push(LayoutRow::Member(member.clone()));
            if member.padding > 0 {
                rows.push(LayoutRow::Padding {
                    offset: member.offset + member.size,
                    size: member.padding,
                });
            }
        }
        rows
    }
}

/// Computes and memoizes padding reports over a type table.
#[derive(Debug)]
pub struct PaddingAnalyzer<'a>
{
    table: &'a TypeTable,
    reports: HashMap<TypeId, Arc<PaddingReport>>,
    in_progress: HashSet<TypeId>,
}

impl<'a> PaddingAnalyzer<'a>
{
    pub fn new(table: &'a TypeTable) -> Self
    {
        Self {
            table,
            reports: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Padding report of a class, struct or union.
    ///
    /// ## Errors
    ///
    /// - [`GenError::NotAUserType`] for other types
    /// - [`GenError::MissingType`] for dangling field or base handles
    pub fn analyze(&mut self, id: TypeId) -> Result<Arc<PaddingReport>>
    {
        if let Some(report) = self.reports.get(&id) {
            return Ok(Arc::clone(report));
        }

        let table = self.table;
        let descriptor = table.resolve(id, || format!("padding analysis {id}"))?;
        if !descriptor.tag.is_user_type() {
            return Err(GenError::NotAUserType {
                type_name: descriptor.name.clone(),
                tag: descriptor.tag.to_string(),
            });
        }

        self.in_progress.insert(id);
        let members = self.members(id);
        self.in_progress.remove(&id);
        let mut members = members?;

        members.sort_by_key(|member| (!member.is_base, member.offset));
        let mut total_padding = 0u64;
        for index in 0..members.len() {
            let next = members.get(index + 1).map_or(descriptor.size, |next| next.offset);
            let member = &mut members[index];
            let gap = next.saturating_sub(member.offset.saturating_add(member.size));
            member.padding = member.padding.saturating_add(gap);
            total_padding = total_padding.saturating_add(member.padding);
        }

        trace!(type_name = %descriptor.name, total_padding, "Analyzed padding");
        let report = Arc::new(PaddingReport {
            id,
            type_name: descriptor.name.clone(),
            size: descriptor.size,
            members,
            total_padding,
        });
        self.reports.insert(id, Arc::clone(&report));
        Ok(report)
    }

    /// Reports for every user type in the table, in table order.
    ///
    /// ## Errors
    ///
    /// The first error of [`analyze`](Self::analyze).
    pub fn analyze_all(&mut self) -> Result<Vec<Arc<PaddingReport>>>
    {
        let ids: Vec<TypeId> = self.table.user_types().collect();
        ids.into_iter().map(|id| self.analyze(id)).collect()
    }

    fn members(&mut self, id: TypeId) -> Result<Vec<MemberLayout>>
    {
        let table = self.table;
        let descriptor = table.resolve(id, || format!("padding analysis {id}"))?;
        let mut members = Vec::with_capacity(descriptor.fields.len() + descriptor.bases.len());

        for field in descriptor.fields.iter().filter(|field| !field.is_static()) {
            let field_type = table.resolve(field.ty, || format!("field `{}` of `{}`", field.name, descriptor.name))?;
            members.push(MemberLayout {
                name: field.name.clone(),
                type_name: field_type.name.clone(),
                offset: field.offset,
                size: field_type.size,
                padding: self.nested_padding(field.ty)?,
                is_base: false,
            });
        }

        for base in &descriptor.bases {
            let Some(offset) = base.offset.and_then(|offset| u64::try_from(offset).ok()) else {
                continue;
            };
            let base_type = table.resolve(base.ty, || format!("base class of `{}`", descriptor.name))?;
            members.push(MemberLayout {
                name: format!("Base: {}", base_type.name),
                type_name: base_type.name.clone(),
                offset,
                size: base_type.size,
                padding: self.nested_padding(base.ty)?,
                is_base: true,
            });
        }
        Ok(members)
    }

    /// Padding inside a member's type; arrays count it once per element.
    fn nested_padding(&mut self, id: TypeId) -> Result<u64>
    {
        let table = self.table;
        let descriptor = table.resolve(id, || format!("member type {id}"))?;
        match descriptor.tag {
            tag if tag.is_user_type() => {
                if self.in_progress.contains(&id) {
                    return Ok(0);
                }
                Ok(self.analyze(id)?.total_padding)
            }
            TypeTag::Array => {
                let Some(element) = descriptor.element else {
                    return Ok(0);
                };
                let element_size = table.resolve(element, || format!("element of `{}`", descriptor.name))?.size;
                let count = descriptor.size.checked_div(element_size).unwrap_or(0);
                Ok(self.nested_padding(element)?.saturating_mul(count))
            }
            _ => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::symbols::TypeTableBuilder;
    use crate::types::{BaseClass, FieldDescriptor, NativeBaseType, TypeDescriptor};

    #[test]
    fn test_nested_padding_propagates()
    {
        let mut builder = TypeTableBuilder::new();
        let ch = builder.add(TypeDescriptor::basic("char", NativeBaseType::Char, 1));
        let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
        let inner = builder.add(
            TypeDescriptor::structure("Inner", 8)
                .with_field(FieldDescriptor::new("c", ch, 0, 1))
                .with_field(FieldDescriptor::new("i", int, 4, 4)),
        );
        let pair = builder.add(TypeDescriptor::array("Inner[2]", inner, 16));
        let outer = builder.add(
            TypeDescriptor::structure("Outer", 24)
                .with_field(FieldDescriptor::new("items", pair, 0, 16))
                .with_field(FieldDescriptor::new("tail", ch, 16, 1)),
        );
        let table = builder.build().unwrap();

        let mut analyzer = PaddingAnalyzer::new(&table);
        let report = analyzer.analyze(outer).unwrap();
        // 3 bytes in each Inner, 7 after `tail`
        assert_eq!(report.members[0].padding, 6);
        assert_eq!(report.members[1].padding, 7);
        assert_eq!(report.total_padding, 13);
        assert!((report.padding_ratio() - 13.0 / 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bases_sort_first()
    {
        let mut builder = TypeTableBuilder::new();
        let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
        let base = builder.add(TypeDescriptor::class("Base", 4).with_field(FieldDescriptor::new("b", int, 0, 4)));
        let derived = builder.add(
            TypeDescriptor::class("Derived", 12)
                .with_field(FieldDescriptor::new("x", int, 0, 4))
                .with_base(BaseClass::at(base, 8))
                .with_field(FieldDescriptor::static_member("count", int, 4)),
        );
        let table = builder.build().unwrap();

        let report = PaddingAnalyzer::new(&table).analyze(derived).unwrap();
        let names: Vec<_> = report.members.iter().map(|member| member.name.as_str()).collect();
        assert_eq!(names, vec!["Base: Base", "x"]);
    }

    #[test]
    fn test_rows_insert_cache_line_boundaries()
    {
        let member = |name: &str, offset, size, padding| MemberLayout {
            name: name.to_string(),
            type_name: "T".to_string(),
            offset,
            size,
            padding,
            is_base: false,
        };
        let report = PaddingReport {
            id: TypeId::from_index(0),
            type_name: "Wide".to_string(),
            size: 160,
            members: vec![member("a", 0, 8, 0), member("b", 8, 4, 60), member("c", 72, 88, 0)],
            total_padding: 60,
        };

        let rows = report.rows(64, 0);
        assert_eq!(
            rows,
            vec![
                LayoutRow::Member(member("a", 0, 8, 0)),
                LayoutRow::Member(member("b", 8, 4, 60)),
                LayoutRow::Padding { offset: 12, size: 60 },
                LayoutRow::CacheLineBoundary { offset: 64 },
                LayoutRow::Member(member("c", 72, 88, 0)),
            ]
        );
        assert!(report
            .rows(0, 0)
            .iter()
            .all(|row| !matches!(row, LayoutRow::CacheLineBoundary { .. })));
    }

    #[test]
    fn test_non_user_types_are_rejected()
    {
        let mut builder = TypeTableBuilder::new();
        let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
        let table = builder.build().unwrap();
        assert!(matches!(
            PaddingAnalyzer::new(&table).analyze(int),
            Err(GenError::NotAUserType { .. })
        ));
    }
}
