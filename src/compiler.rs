//! Compiler↔loader glue (spec.md §4.9, contract only): a minimal
//! declaration-syntax compiler that turns parcel source text into a
//! [`ModuleInfo`] through the same [`ParcelDefBuilder`] the loader's
//! builder-level API already uses. It never resolves a specifier itself —
//! every type reference is interned as a constant-table `RefSym` and left
//! for the load manager's early/late resolution pipeline, exactly as a
//! hand-built [`ParcelDefBuilder`] module would. This mirrors the
//! specification's own framing: the compiler "consumes the loader via two
//! operations only" (import by path, resolve by the same load path used
//! at runtime) — resolution is the loader's job, not the parser's.
//!
//! Declaration syntax (informal):
//! ```text
//! import self/util;
//!
//! struct Box[T: yama:Any] {
//!     fn get() -> $T;
//! }
//!
//! protocol Countable {
//!     fn count() -> yama:Int;
//! }
//!
//! fn make_box(x: yama:Int) -> self:Box[yama:Int];
//! ```

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{alpha1, alphanumeric1, char as nom_char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, recognize};
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

use crate::errors::{Result, YamaError};
use crate::loader::builder::ParcelDefBuilder;
use crate::model::ModuleInfo;

type Param = (String, String);

enum Item {
    Import(String),
    Struct(TypeDecl),
    Protocol(TypeDecl),
    Fn(String, Vec<Param>, String),
}

struct TypeDecl {
    name: String,
    type_params: Vec<Param>,
    methods: Vec<(String, Vec<Param>, String)>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, recognize(nom_char('_')))),
        many0(alt((alphanumeric1, recognize(nom_char('_'))))),
    ))(input)
}

/// A raw specifier token: scanned by bracket depth rather than by the
/// specifier grammar itself (that full grammar lives in
/// [`crate::specifier`] and is applied later, when the builder interns
/// this text). Stops at the first top-level delimiter or whitespace.
fn typeref(input: &str) -> IResult<&str, &str> {
    let mut depth: i32 = 0;
    let mut end = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' | ')' | ';' | '{' | '}' if depth <= 0 => break,
            c if c.is_whitespace() && depth <= 0 => break,
            _ => {}
        }
        end = i + c.len_utf8();
    }
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::TakeWhile1)));
    }
    Ok((&input[end..], &input[..end]))
}

fn ws0(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn import_path(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || "_/.".contains(c))(input)
}

fn param(input: &str) -> IResult<&str, Param> {
    map(
        separated_pair(identifier, tuple((ws0, nom_char(':'), ws0)), typeref),
        |(name, ty)| (name.to_string(), ty.to_string()),
    )(input)
}

fn param_list(input: &str) -> IResult<&str, Vec<Param>> {
    delimited(
        pair(nom_char('('), ws0),
        separated_list0(delimited(ws0, nom_char(','), ws0), param),
        pair(ws0, nom_char(')')),
    )(input)
}

fn type_params(input: &str) -> IResult<&str, Vec<Param>> {
    delimited(
        pair(nom_char('['), ws0),
        separated_list0(delimited(ws0, nom_char(','), ws0), param),
        pair(ws0, nom_char(']')),
    )(input)
}

fn ret_arrow(input: &str) -> IResult<&str, &str> {
    preceded(tuple((ws0, tag("->"), ws0)), typeref)(input)
}

fn method_decl(input: &str) -> IResult<&str, (String, Vec<Param>, String)> {
    map(
        tuple((
            preceded(tuple((ws0, tag("fn"), multispace1)), identifier),
            preceded(ws0, param_list),
            terminated(ret_arrow, pair(ws0, nom_char(';'))),
        )),
        |(name, params, ret)| (name.to_string(), params, ret.to_string()),
    )(input)
}

fn type_decl_body(input: &str) -> IResult<&str, (Vec<Param>, Vec<(String, Vec<Param>, String)>)> {
    let (input, tps) = map(nom::combinator::opt(preceded(ws0, type_params)), |o| o.unwrap_or_default())(input)?;
    let (input, methods) = delimited(
        tuple((ws0, nom_char('{'))),
        many0(method_decl),
        tuple((ws0, nom_char('}'))),
    )(input)?;
    Ok((input, (tps, methods)))
}

fn struct_item(input: &str) -> IResult<&str, Item> {
    map(
        pair(
            preceded(tuple((ws0, tag("struct"), multispace1)), identifier),
            type_decl_body,
        ),
        |(name, (type_params, methods))| {
            Item::Struct(TypeDecl {
                name: name.to_string(),
                type_params,
                methods,
            })
        },
    )(input)
}

fn protocol_item(input: &str) -> IResult<&str, Item> {
    map(
        pair(
            preceded(tuple((ws0, tag("protocol"), multispace1)), identifier),
            type_decl_body,
        ),
        |(name, (type_params, methods))| {
            Item::Protocol(TypeDecl {
                name: name.to_string(),
                type_params,
                methods,
            })
        },
    )(input)
}

fn fn_item(input: &str) -> IResult<&str, Item> {
    map(
        tuple((
            preceded(tuple((ws0, tag("fn"), multispace1)), identifier),
            preceded(ws0, param_list),
            terminated(ret_arrow, pair(ws0, nom_char(';'))),
        )),
        |(name, params, ret)| Item::Fn(name.to_string(), params, ret.to_string()),
    )(input)
}

fn import_item(input: &str) -> IResult<&str, Item> {
    map(
        delimited(
            tuple((ws0, tag("import"), multispace1)),
            import_path,
            pair(ws0, nom_char(';')),
        ),
        |path: &str| Item::Import(path.to_string()),
    )(input)
}

fn item(input: &str) -> IResult<&str, Item> {
    alt((import_item, struct_item, protocol_item, fn_item))(input)
}

fn source(input: &str) -> IResult<&str, Vec<Item>> {
    map(pair(many0(item), ws0), |(items, _)| items)(input)
}

fn parse_source(text: &str) -> std::result::Result<Vec<Item>, String> {
    all_consuming(source)(text).map(|(_, items)| items).map_err(|e| format!("{e}"))
}

/// Result of compiling a parcel's source files: the module to bind, plus
/// the import paths the source files named (for the caller to follow —
/// the compiler does not itself drive imports).
pub struct CompiledParcel {
    pub module: ModuleInfo,
    pub imports: Vec<String>,
}

pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles every source file into one [`ModuleInfo`]: declarations
    /// across files are folded into a single builder, since a parcel's
    /// module is one namespace regardless of how its source is split
    /// (spec.md §4.9 "compilation is recursive").
    pub fn compile_parcel(&self, sources: &[(String, String)]) -> Result<CompiledParcel> {
        let mut builder = ParcelDefBuilder::new();
        let mut imports = Vec::new();

        for (path, text) in sources {
            let items = parse_source(text)
                .map_err(|e| YamaError::internal(format!("declaration syntax error in `{path}`: {e}")))?;
            for it in items {
                match it {
                    Item::Import(p) => imports.push(p),
                    Item::Struct(decl) => self.emit_type_decl(&mut builder, decl, false)?,
                    Item::Protocol(decl) => self.emit_type_decl(&mut builder, decl, true)?,
                    Item::Fn(name, params, ret) => {
                        let h = builder.add_fn(&name, &ret)?;
                        for (pname, pty) in params {
                            builder.add_param(h, &pname, &pty)?;
                        }
                    }
                }
            }
        }

        log::info!("compiled {} source file(s) into a module", sources.len());
        Ok(CompiledParcel {
            module: builder.finish()?,
            imports,
        })
    }

    fn emit_type_decl(&self, builder: &mut ParcelDefBuilder, decl: TypeDecl, is_protocol: bool) -> Result<()> {
        let handle = if is_protocol {
            builder.add_protocol(&decl.name)?
        } else {
            builder.add_struct(&decl.name)?
        };
        for (name, constraint) in decl.type_params {
            builder.add_type_param(handle, &name, &constraint)?;
        }
        for (name, params, ret) in decl.methods {
            let m = if is_protocol {
                builder.add_method_req(handle, &name, &ret)?
            } else {
                builder.add_method(handle, &name, &ret)?
            };
            for (pname, pty) in params {
                builder.add_param(m, &pname, &pty)?;
            }
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_struct_protocol_and_fn_with_imports() {
        let source = r#"
            import self/util;

            protocol Countable {
                fn count() -> yama:Int;
            }

            struct Box[T: yama:Any] {
                fn get() -> $T;
            }

            fn make_box(x: yama:Int) -> self:Box[yama:Int];
        "#;
        let compiler = Compiler::new();
        let result = compiler.compile_parcel(&[("main.yama".to_string(), source.to_string())]).unwrap();

        assert_eq!(result.imports, vec!["self/util".to_string()]);
        assert!(result.module.by_name("Countable").is_some());
        assert!(result.module.by_name("Countable::count").is_some());
        assert!(result.module.by_name("Box").is_some());
        assert!(result.module.by_name("Box::get").is_some());
        let f = result.module.by_name("make_box").unwrap();
        assert_eq!(f.params.len(), 1);
    }

    #[test]
    fn rejects_malformed_source() {
        let compiler = Compiler::new();
        let err = compiler.compile_parcel(&[("bad.yama".to_string(), "struct {".to_string())]);
        assert!(err.is_err());
    }
}
