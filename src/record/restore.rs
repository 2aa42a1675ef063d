use std::collections::HashMap;

use crate::codec::Cursor;
use crate::error::LoggingError;

use super::argument::tag;

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Bool(bool),
    Char(char),
    Signed(i64),
    Unsigned(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    Pointer(u64),
    Custom { pattern: &'a str, args: &'a [u8] },
    List(&'a [u8]),
}

impl Value<'_> {
    fn as_count(&self) -> Option<usize> {
        match *self {
            Value::Signed(v) if v >= 0 => Some(v as usize),
            Value::Unsigned(v) => Some(v as usize),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Arguments<'a> {
    positional: Vec<Value<'a>>,
    named: HashMap<&'a str, Value<'a>>,
}

impl<'a> Arguments<'a> {
    fn parse(buffer: &'a [u8]) -> Result<Self, LoggingError> {
        let mut cursor = Cursor::new(buffer);
        let mut args = Self::default();
        while !cursor.is_empty() {
            let kind = cursor.u8()?;
            if kind == tag::NAMED {
                let len = cursor.u32()? as usize;
                let name = cursor.str(len)?;
                let kind = cursor.u8()?;
                args.named.insert(name, parse_value(kind, &mut cursor)?);
            } else {
                args.positional.push(parse_value(kind, &mut cursor)?);
            }
        }
        Ok(args)
    }

    fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

fn parse_value<'a>(kind: u8, cursor: &mut Cursor<'a>) -> Result<Value<'a>, LoggingError> {
    let value = match kind {
        tag::BOOL => Value::Bool(cursor.u8()? != 0),
        tag::CHAR => Value::Char(
            char::from_u32(cursor.u32()?).ok_or(LoggingError::Decode("invalid char"))?,
        ),
        tag::I8 => Value::Signed(cursor.u8()? as i8 as i64),
        tag::U8 => Value::Unsigned(cursor.u8()? as u64),
        tag::I16 => Value::Signed(cursor.u16()? as i16 as i64),
        tag::U16 => Value::Unsigned(cursor.u16()? as u64),
        tag::I32 => Value::Signed(cursor.u32()? as i32 as i64),
        tag::U32 => Value::Unsigned(cursor.u32()? as u64),
        tag::I64 => Value::Signed(cursor.u64()? as i64),
        tag::U64 => Value::Unsigned(cursor.u64()?),
        tag::F32 => Value::F32(f32::from_bits(cursor.u32()?)),
        tag::F64 => Value::F64(f64::from_bits(cursor.u64()?)),
        tag::STRING => {
            let len = cursor.u32()? as usize;
            Value::Str(cursor.str(len)?)
        }
        tag::POINTER => Value::Pointer(cursor.u64()?),
        tag::CUSTOM => {
            let total = cursor.u32()? as usize;
            let pattern_len = cursor.u32()? as usize;
            let pattern = cursor.str(pattern_len)?;
            let rest = total
                .checked_sub(8 + pattern_len)
                .ok_or(LoggingError::Decode("invalid custom argument size"))?;
            Value::Custom {
                pattern,
                args: cursor.bytes(rest)?,
            }
        }
        tag::LIST => {
            let total = cursor.u32()? as usize;
            let rest = total
                .checked_sub(4)
                .ok_or(LoggingError::Decode("invalid list argument size"))?;
            Value::List(cursor.bytes(rest)?)
        }
        _ => return Err(LoggingError::Decode("unknown argument type")),
    };
    Ok(value)
}

/// Renders `pattern` with the arguments serialized in `buffer`.
///
/// Any malformed pattern, missing argument or corrupted buffer yields the
/// pattern unchanged.
pub(crate) fn restore_format(pattern: &str, buffer: &[u8]) -> String {
    let args = match Arguments::parse(buffer) {
        Ok(args) if !args.is_empty() => args,
        _ => return pattern.to_string(),
    };
    render(pattern, &args).unwrap_or_else(|| pattern.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

#[derive(Debug, Clone, Copy)]
struct Style {
    fill: char,
    align: Option<Align>,
    sign: Sign,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            sign: Sign::Minus,
            alternate: false,
            width: 0,
            precision: None,
            kind: None,
        }
    }
}

enum ArgRef {
    Auto,
    Index(usize),
    Name(String),
}

struct FieldParser<'p, 'a> {
    chars: &'p [char],
    pos: usize,
    next_index: &'p mut usize,
    args: &'p Arguments<'a>,
}

impl<'p, 'a> FieldParser<'p, 'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn number(&mut self) -> Option<usize> {
        let mut value: usize = 0;
        while let Some(c) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value.checked_mul(10)?.checked_add(c as usize)?;
            if value > i32::MAX as usize {
                return None;
            }
            self.pos += 1;
        }
        Some(value)
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn arg_ref(&mut self) -> Option<ArgRef> {
        match self.peek()? {
            c if c.is_ascii_digit() => self.number().map(ArgRef::Index),
            c if c.is_ascii_alphabetic() || c == '_' => Some(ArgRef::Name(self.name())),
            _ => Some(ArgRef::Auto),
        }
    }

    fn resolve(&mut self, arg: ArgRef) -> Option<Value<'a>> {
        match arg {
            ArgRef::Auto => {
                let index = *self.next_index;
                *self.next_index += 1;
                self.args.positional.get(index).copied()
            }
            ArgRef::Index(index) => self.args.positional.get(index).copied(),
            ArgRef::Name(name) => self.args.named.get(name.as_str()).copied(),
        }
    }

    /// Parses `{}` / `{n}` / `{name}` used as a dynamic width or precision.
    fn nested_count(&mut self) -> Option<usize> {
        // Skip '{'
        self.pos += 1;
        let arg = self.arg_ref()?;
        if self.peek()? != '}' {
            return None;
        }
        self.pos += 1;
        self.resolve(arg)?.as_count()
    }

    fn style(&mut self) -> Option<Style> {
        let mut style = Style::default();

        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::Numeric),
            _ => None,
        };

        if let Some(align) = self.peek_at(1).and_then(align_of) {
            let fill = self.peek()?;
            if fill == '{' || fill == '}' {
                return None;
            }
            style.fill = fill;
            style.align = Some(align);
            self.pos += 2;
        } else if let Some(align) = self.peek().and_then(align_of) {
            style.align = Some(align);
            self.pos += 1;
        }

        match self.peek() {
            Some('+') => {
                style.sign = Sign::Plus;
                self.pos += 1;
            }
            Some('-') => {
                self.pos += 1;
            }
            Some(' ') => {
                style.sign = Sign::Space;
                self.pos += 1;
            }
            _ => {}
        }

        if self.peek() == Some('#') {
            style.alternate = true;
            self.pos += 1;
        }

        if self.peek() == Some('0') {
            if style.align.is_none() {
                style.align = Some(Align::Numeric);
                style.fill = '0';
            }
            self.pos += 1;
        }

        match self.peek() {
            Some(c) if c.is_ascii_digit() => style.width = self.number()?,
            Some('{') => style.width = self.nested_count()?,
            _ => {}
        }

        if self.peek() == Some('.') {
            self.pos += 1;
            match self.peek()? {
                c if c.is_ascii_digit() => style.precision = Some(self.number()?),
                '{' => style.precision = Some(self.nested_count()?),
                _ => return None,
            }
        }

        match self.peek()? {
            '}' => {}
            c if "dxXobBceEfFgG%sp".contains(c) => {
                style.kind = Some(c);
                self.pos += 1;
            }
            _ => return None,
        }

        Some(style)
    }

    /// Parses one replacement field; `pos` points right after the opening
    /// brace. Returns the rendered field.
    fn field(&mut self) -> Option<String> {
        let arg = self.arg_ref()?;
        let value = self.resolve(arg)?;

        let style = if self.peek()? == ':' {
            self.pos += 1;
            self.style()?
        } else {
            Style::default()
        };

        if self.peek()? != '}' {
            return None;
        }
        self.pos += 1;

        write_value(&value, &style)
    }
}

fn render(pattern: &str, args: &Arguments) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut next_index = 0;
    let mut pos = 0;

    while pos < chars.len() {
        match chars[pos] {
            '{' if chars.get(pos + 1) == Some(&'{') => {
                out.push('{');
                pos += 2;
            }
            '}' if chars.get(pos + 1) == Some(&'}') => {
                out.push('}');
                pos += 2;
            }
            '{' => {
                let mut parser = FieldParser {
                    chars: &chars,
                    pos: pos + 1,
                    next_index: &mut next_index,
                    args,
                };
                let field = parser.field()?;
                pos = parser.pos;
                out.push_str(&field);
            }
            c => {
                out.push(c);
                pos += 1;
            }
        }
    }

    Some(out)
}

fn write_value(value: &Value, style: &Style) -> Option<String> {
    match *value {
        Value::Bool(b) => match style.kind {
            None | Some('s') => Some(pad_text(if b { "true" } else { "false" }, style)),
            Some(_) => write_integer(false, u64::from(b), style),
        },
        Value::Char(c) => match style.kind {
            None | Some('c') => Some(pad_text(c.encode_utf8(&mut [0u8; 4]), style)),
            Some(_) => write_integer(false, u64::from(u32::from(c)), style),
        },
        Value::Signed(v) => write_integer(v < 0, v.unsigned_abs(), style),
        Value::Unsigned(v) => write_integer(false, v, style),
        Value::F32(v) => write_float(v as f64, Some(v), style),
        Value::F64(v) => write_float(v, None, style),
        Value::Str(s) => {
            if !matches!(style.kind, None | Some('s')) {
                return None;
            }
            match style.precision {
                Some(p) => {
                    let truncated: String = s.chars().take(p).collect();
                    Some(pad_text(&truncated, style))
                }
                None => Some(pad_text(s, style)),
            }
        }
        Value::Pointer(p) => Some(pad_number("", &format!("0x{:x}", p), style)),
        Value::Custom { pattern, args } => Some(pad_text(&restore_format(pattern, args), style)),
        Value::List(bytes) => {
            let mut cursor = Cursor::new(bytes);
            let mut out = String::new();
            while !cursor.is_empty() {
                let kind = cursor.u8().ok()?;
                let item = parse_value(kind, &mut cursor).ok()?;
                out.push_str(&write_value(&item, style)?);
            }
            Some(out)
        }
    }
}

fn sign_prefix(negative: bool, sign: Sign) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Sign::Plus) => "+",
        (false, Sign::Space) => " ",
        (false, Sign::Minus) => "",
    }
}

fn write_integer(negative: bool, magnitude: u64, style: &Style) -> Option<String> {
    let (prefix, digits) = match style.kind {
        None | Some('d') => ("", magnitude.to_string()),
        Some('x') => ("0x", format!("{:x}", magnitude)),
        Some('X') => ("0X", format!("{:X}", magnitude)),
        Some('o') => ("0", format!("{:o}", magnitude)),
        Some('b') => ("0b", format!("{:b}", magnitude)),
        Some('B') => ("0B", format!("{:b}", magnitude)),
        Some('c') => {
            let c = char::from_u32(u32::try_from(magnitude).ok()?)?;
            return Some(pad_text(c.encode_utf8(&mut [0u8; 4]), style));
        }
        Some(_) => return None,
    };

    let mut head = sign_prefix(negative, style.sign).to_string();
    if style.alternate && !(style.kind == Some('o') && magnitude == 0) {
        head.push_str(prefix);
    }
    Some(pad_number(&head, &digits, style))
}

fn write_float(value: f64, single: Option<f32>, style: &Style) -> Option<String> {
    let negative = value.is_sign_negative() && !value.is_nan();
    let magnitude = value.abs();
    let upper = matches!(style.kind, Some('F') | Some('E') | Some('G'));

    let mut body = if magnitude.is_nan() {
        "nan".to_string()
    } else if magnitude.is_infinite() {
        "inf".to_string()
    } else {
        match (style.kind, style.precision) {
            (None, None) => match single {
                Some(v) => v.abs().to_string(),
                None => magnitude.to_string(),
            },
            (Some('g') | Some('G'), Some(p)) => general(magnitude, p.max(1)),
            (Some('g') | Some('G'), None) => general(magnitude, 6),
            (None, Some(p)) => format!("{:.*}", p, magnitude),
            (Some('f') | Some('F'), p) => format!("{:.*}", p.unwrap_or(6), magnitude),
            (Some('e') | Some('E'), p) => exponent(magnitude, p.unwrap_or(6)),
            (Some('%'), p) => format!("{:.*}%", p.unwrap_or(6), magnitude * 100.0),
            _ => return None,
        }
    };
    if upper {
        body = body.to_uppercase();
    }

    Some(pad_number(sign_prefix(negative, style.sign), &body, style))
}

/// `1.5e+03` style, with at least two exponent digits.
fn exponent(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

/// `%g` style: `precision` significant digits, trailing zeros removed.
fn general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exp = value.abs().log10().floor() as i32;
    if exp < -4 || exp >= precision as i32 {
        let formatted = exponent(value, precision - 1);
        match formatted.split_once('e') {
            Some((mantissa, rest)) => format!("{}e{}", trim_fraction(mantissa), rest),
            None => formatted,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn fill(count: usize, c: char) -> String {
    std::iter::repeat(c).take(count).collect()
}

fn pad(head: &str, body: &str, style: &Style, default: Align) -> String {
    let len = head.chars().count() + body.chars().count();
    if len >= style.width {
        return format!("{}{}", head, body);
    }
    let missing = style.width - len;
    match style.align.unwrap_or(default) {
        Align::Left => format!("{}{}{}", head, body, fill(missing, style.fill)),
        Align::Right => format!("{}{}{}", fill(missing, style.fill), head, body),
        Align::Center => {
            let left = missing / 2;
            format!(
                "{}{}{}{}",
                fill(left, style.fill),
                head,
                body,
                fill(missing - left, style.fill)
            )
        }
        Align::Numeric => format!("{}{}{}", head, fill(missing, style.fill), body),
    }
}

fn pad_text(text: &str, style: &Style) -> String {
    pad("", text, style, Align::Left)
}

fn pad_number(head: &str, body: &str, style: &Style) -> String {
    pad(head, body, style, Align::Right)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::argument::{named, store_arguments, store_custom, Argument, ListWriter};

    fn store(pattern: &str, args: &[&dyn Argument]) -> String {
        let mut buffer = Vec::new();
        store_arguments(&mut buffer, args);
        restore_format(pattern, &buffer)
    }

    struct Date(i32, i32, i32);

    impl Argument for Date {
        fn store(&self, buffer: &mut Vec<u8>) {
            store_custom(buffer, "{}-{}-{}", &[&self.0, &self.1, &self.2]);
        }
    }

    struct DateTime(Date, i32, i32, i32);

    impl Argument for DateTime {
        fn store(&self, buffer: &mut Vec<u8>) {
            let mut list = ListWriter::new(buffer);
            list.push(&self.0)
                .push(&' ')
                .push(&self.1)
                .push(&':')
                .push(&self.2)
                .push(&':')
                .push(&self.3);
        }
    }

    #[test]
    fn test_positional() {
        assert_eq!(store("no arguments", &[]), "no arguments");
        assert_eq!(store("{0}, {1}, {2}", &[&-1, &0, &1]), "-1, 0, 1");
        assert_eq!(store("{0}, {1}, {2}", &[&'a', &'b', &'c']), "a, b, c");
        assert_eq!(store("{}, {}, {}", &[&'a', &'b', &'c']), "a, b, c");
        assert_eq!(store("{2}, {1}, {0}", &[&'a', &'b', &'c']), "c, b, a");
        assert_eq!(store("{0}{1}{0}", &[&"abra", &"cad"]), "abracadabra");
    }

    #[test]
    fn test_alignment() {
        assert_eq!(
            store("{:<30}", &[&"left aligned"]),
            "left aligned                  "
        );
        assert_eq!(
            store("{:>30}", &[&"right aligned"]),
            "                 right aligned"
        );
        assert_eq!(
            store("{:^30}", &[&"centered"]),
            "           centered           "
        );
        assert_eq!(
            store("{:*^30}", &[&"centered"]),
            "***********centered***********"
        );
        assert_eq!(store("{:05}", &[&-42]), "-0042");
        assert_eq!(store("{:>6}", &[&42u16]), "    42");
        assert_eq!(store("{:6}", &[&42u16]), "    42");
        assert_eq!(store("{:6}", &[&"ab"]), "ab    ");
    }

    #[test]
    fn test_sign_and_float() {
        assert_eq!(
            store("{:+f}; {:+f}", &[&3.14, &-3.14]),
            "+3.140000; -3.140000"
        );
        assert_eq!(
            store("{: f}; {: f}", &[&3.14, &-3.14]),
            " 3.140000; -3.140000"
        );
        assert_eq!(
            store("{:-f}; {:-f}", &[&3.14, &-3.14]),
            "3.140000; -3.140000"
        );
        assert_eq!(store("{}", &[&1.5f32]), "1.5");
        assert_eq!(store("{:.2e}", &[&1234.5]), "1.23e+03");
        assert_eq!(store("{:g}", &[&0.5]), "0.5");
        assert_eq!(store("{:.2}", &[&2.0f32]), "2.00");
        assert_eq!(store("{:.1%}", &[&0.25]), "25.0%");
    }

    #[test]
    fn test_integer_bases() {
        assert_eq!(
            store("int: {0:d};  hex: {0:x};  oct: {0:o}; bin: {0:b}", &[&42]),
            "int: 42;  hex: 2a;  oct: 52; bin: 101010"
        );
        assert_eq!(
            store("int: {0:d};  hex: {0:#x};  oct: {0:#o};  bin: {0:#b}", &[&42]),
            "int: 42;  hex: 0x2a;  oct: 052;  bin: 0b101010"
        );
        assert_eq!(store("{:#010x}", &[&255u32]), "0x000000ff");
        assert_eq!(store("{:X}", &[&255u8]), "FF");
    }

    #[test]
    fn test_custom_and_list() {
        assert_eq!(
            store("The date is {}", &[&Date(2012, 12, 9)]),
            "The date is 2012-12-9"
        );
        assert_eq!(
            store(
                "The datetime is {}",
                &[&DateTime(Date(2012, 12, 9), 13, 15, 57)]
            ),
            "The datetime is 2012-12-9 13:15:57"
        );
    }

    #[test]
    fn test_named_and_dynamic_width() {
        assert_eq!(
            store("Elapsed time: {s:.2f} seconds", &[&named("s", &1.23)]),
            "Elapsed time: 1.23 seconds"
        );
        assert_eq!(store("{:>{}}", &[&"x", &3]), "  x");
        assert_eq!(store("{0:.{1}f}", &[&3.14159, &2]), "3.14");
        assert_eq!(
            store("{v:{w}}|", &[&named("v", &7), &named("w", &3)]),
            "  7|"
        );
    }

    #[test]
    fn test_escapes_and_bools() {
        assert_eq!(store("{{}} {}", &[&true]), "{} true");
        assert_eq!(store("{:d}", &[&true]), "1");
        assert_eq!(store("{:.3}", &[&"abcdef"]), "abc");
    }

    #[test]
    fn test_malformed_returns_pattern() {
        assert_eq!(store("{} {}", &[&1]), "{} {}");
        assert_eq!(store("{0", &[&1]), "{0");
        assert_eq!(store("{:q}", &[&1]), "{:q}");
        assert_eq!(store("{missing}", &[&1]), "{missing}");
        assert_eq!(restore_format("{}", &[0xEE, 1, 2]), "{}");
    }

    #[test]
    fn test_pointer() {
        let value = 5u8;
        let ptr = &value as *const u8;
        let rendered = store("{}", &[&ptr]);
        assert_eq!(rendered, format!("0x{:x}", ptr as usize));
    }
}
