//! Syntax-only parser for the specifier grammar (spec.md §4.1, §6).
//!
//! Lexical shape: `root (segment)* (callsuffix)?` where `root` is one of
//! `%here`, `$Self`, `$Ident`, or a plain identifier, and `segment` is one
//! of `/ident`, `:ident`, `::ident`, or `[arg, …]`. No semantic validation
//! (path-vs-type legality) happens here — see [`super::solver`].

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char as nom_char, multispace0},
    combinator::{all_consuming, map, recognize, verify},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};

use super::ast::{CallSuffix, ParsedSpecifier, Root, Segment};

type PResult<'a, O> = IResult<&'a str, O>;

const RESERVED_ROOTS: &[&str] = &["yama"];

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, recognize(nom_char('_')))),
        many0(alt((alphanumeric1, recognize(nom_char('_'))))),
    ))(input)
}

fn root(input: &str) -> PResult<'_, Root> {
    alt((
        map(tag("%here"), |_| Root::Here),
        map(preceded(nom_char('$'), identifier), |id: &str| {
            if id == "Self" {
                Root::SelfType
            } else {
                Root::Param(id.to_string())
            }
        }),
        map(identifier, |id: &str| Root::Ident(id.to_string())),
    ))(input)
}

fn subdir_segment(input: &str) -> PResult<'_, Segment> {
    map(preceded(nom_char('/'), identifier), |id: &str| {
        Segment::Subdir(id.to_string())
    })(input)
}

fn member_segment(input: &str) -> PResult<'_, Segment> {
    map(preceded(tag("::"), identifier), |id: &str| {
        Segment::Member(id.to_string())
    })(input)
}

// Must be tried after member_segment, since "::" also begins with ':'.
fn enter_parcel_segment(input: &str) -> PResult<'_, Segment> {
    map(preceded(nom_char(':'), identifier), |id: &str| {
        Segment::EnterParcel(id.to_string())
    })(input)
}

fn args_segment(input: &str) -> PResult<'_, Segment> {
    map(
        delimited(
            nom_char('['),
            separated_list0(
                delimited(multispace0, nom_char(','), multispace0),
                |i| specifier_inner(i, false),
            ),
            nom_char(']'),
        ),
        Segment::Args,
    )(input)
}

fn segment(input: &str) -> PResult<'_, Segment> {
    alt((member_segment, enter_parcel_segment, subdir_segment, args_segment))(input)
}

fn call_suffix(input: &str) -> PResult<'_, CallSuffix> {
    map(
        separated_pair(
            delimited(
                pair(nom_char('('), multispace0),
                separated_list0(
                    delimited(multispace0, nom_char(','), multispace0),
                    |i| specifier_inner(i, false),
                ),
                pair(multispace0, nom_char(')')),
            ),
            delimited(multispace0, tag("->"), multispace0),
            |i| specifier_inner(i, false),
        ),
        |(params, ret)| CallSuffix {
            params,
            ret: Box::new(ret),
        },
    )(input)
}

fn specifier_inner(input: &str, allow_call_suffix: bool) -> PResult<'_, ParsedSpecifier> {
    let (input, root) = root(input)?;
    let (input, segments) = many0(segment)(input)?;
    let (input, call_suffix) = if allow_call_suffix {
        nom::combinator::opt(call_suffix)(input)?
    } else {
        (input, None)
    };
    Ok((
        input,
        ParsedSpecifier {
            root,
            segments,
            call_suffix,
        },
    ))
}

/// Parses `text` as a specifier, syntax only. Trailing garbage is a hard
/// error (the whole input must be consumed).
pub fn parse(text: &str) -> Result<ParsedSpecifier, String> {
    if text.is_empty() {
        return Err("empty specifier".to_string());
    }
    all_consuming(|i| specifier_inner(i, true))(text)
        .map(|(_, spec)| spec)
        .map_err(|e| format!("{e}"))
}

pub fn is_reserved_root(id: &str) -> bool {
    RESERVED_ROOTS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_path() {
        let s = parse("self/sub/dir").unwrap();
        assert_eq!(s.root, Root::Ident("self".to_string()));
        assert_eq!(
            s.segments,
            vec![
                Segment::Subdir("sub".to_string()),
                Segment::Subdir("dir".to_string())
            ]
        );
    }

    #[test]
    fn parses_type_fullname_with_member_and_args() {
        let s = parse("dep:Box[dep:Int]::get").unwrap();
        assert_eq!(s.root, Root::Ident("dep".to_string()));
        assert_eq!(s.segments.len(), 3);
        assert!(matches!(s.segments[0], Segment::EnterParcel(_)));
        assert!(matches!(s.segments[1], Segment::Args(_)));
        assert!(matches!(s.segments[2], Segment::Member(_)));
    }

    #[test]
    fn parses_call_suffix_with_whitespace() {
        let s = parse("self:F( self:Int ,  self:Int ) ->  self:Int").unwrap();
        let suff = s.call_suffix.unwrap();
        assert_eq!(suff.params.len(), 2);
    }

    #[test]
    fn here_self_param_roots() {
        assert_eq!(parse("%here").unwrap().root, Root::Here);
        assert_eq!(parse("$Self").unwrap().root, Root::SelfType);
        assert_eq!(parse("$Self::m").unwrap().root, Root::SelfType);
        assert_eq!(
            parse("$Elem").unwrap().root,
            Root::Param("Elem".to_string())
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("self/!!!").is_err());
    }
}
