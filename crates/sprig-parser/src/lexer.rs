//! Tag-level tokens for HTML fragments.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_until, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

/// A parsed start tag, borrowing from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    /// Attribute names and raw (still entity-encoded) values.
    pub attributes: Vec<(&'a str, Option<&'a str>)>,
    pub self_closing: bool,
}

/// Parse a tag name (letter first, then letters, digits, `-`, `_`, `:`, `.`).
pub fn tag_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')),
    ))(input)
}

fn attribute_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        !c.is_whitespace() && !matches!(c, '/' | '>' | '=' | '"' | '\'' | '<')
    })(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, '>' | '"' | '\'' | '<' | '`')),
    ))(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    pair(
        attribute_name,
        opt(preceded(
            tuple((multispace0, char('='), multispace0)),
            attribute_value,
        )),
    )(input)
}

/// Parse `<name attr="value" ...>` or `<name ... />`.
pub fn start_tag(input: &str) -> IResult<&str, StartTag<'_>> {
    let (input, name) = preceded(char('<'), tag_name)(input)?;
    let (input, attributes) = many0(preceded(multispace1, attribute))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, slash) = opt(char('/'))(input)?;
    let (input, _) = char('>')(input)?;
    Ok((
        input,
        StartTag {
            name,
            attributes,
            self_closing: slash.is_some(),
        },
    ))
}

/// Parse `</name>`, returning the name.
pub fn end_tag(input: &str) -> IResult<&str, &str> {
    delimited(tag("</"), tag_name, pair(multispace0, char('>')))(input)
}

/// Parse a complete `<!-- ... -->` comment.
pub fn comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("<!--"), take_until("-->"), tag("-->"))))(input)
}

/// Parse `<!DOCTYPE ...>`, `<![CDATA[...]>`-style or `<?...>` declarations.
pub fn declaration(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        alt((tag("<!"), tag("<?"))),
        take_till(|c: char| c == '>'),
        char('>'),
    )))(input)
}

/// Parse a run of text up to the next `<`.
pub fn text_run(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == '<')(input)
}
