use syn::{punctuated::Punctuated, token::Comma, Attribute, Expr, ExprAssign, Lit, LitInt, LitStr, Meta};

pub type Assignments = Punctuated<ExprAssign, Comma>;

pub fn get_punctuated(attr: &Attribute, name: &str) -> Assignments {
    match &attr.meta {
        Meta::List(meta_list) => meta_list
            .clone()
            .parse_args_with(Assignments::parse_terminated)
            .unwrap_or_else(|_| panic!("`modbus` attribute for `{name}` is not a comma separated sequence of assignment expressions.")),
        _ => panic!("The `modbus` attribute for `{name}` is not `MetaList`"),
    }
}

pub fn find_modbus_attr(attrs: &[Attribute]) -> Option<&Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident("modbus"))
}

pub fn expr_assign_predicate<'a>(
    key: &'a str,
    name: &'a str,
) -> impl FnMut(&&ExprAssign) -> bool + 'a {
    move |expr_assign| match *expr_assign.left.clone() {
        Expr::Path(left) => left.path.is_ident(key),
        not_expr_path => panic!(
            "In the `modbus` attribute for {}, the key `{:?}` is not a path expression.",
            name, not_expr_path
        ),
    }
}

/// Value of the string literal assigned to `key`, if any.
pub fn get_str(punctuated: &Assignments, key: &str, name: &str) -> Option<String> {
    punctuated
        .iter()
        .filter(expr_assign_predicate(key, name))
        .map(|expr_assign| match *expr_assign.right.clone() {
            Expr::Lit(right) => match right.lit {
                Lit::Str(lit_str) => lit_str,
                _ => panic_not_literal(key, "string", name),
            },
            _ => panic_not_literal(key, "string", name),
        })
        .next()
        .as_ref()
        .map(LitStr::value)
}

/// Value of the `u16` integer literal assigned to `key`, if any.
pub fn get_u16(punctuated: &Assignments, key: &str, name: &str) -> Option<u16> {
    punctuated
        .iter()
        .filter(expr_assign_predicate(key, name))
        .map(|expr_assign| match *expr_assign.right.clone() {
            Expr::Lit(right) => match right.lit {
                Lit::Int(lit_int) => lit_int,
                _ => panic_not_literal(key, "integer", name),
            },
            _ => panic_not_literal(key, "integer", name),
        })
        .next()
        .as_ref()
        .map(|lit_int: &LitInt| {
            lit_int.base10_parse::<u16>().unwrap_or_else(|_| {
                panic!("In `modbus` attribute for `{name}`, the key `{key}` could not be parsed to u16.")
            })
        })
}

pub fn panic_not_literal(key: &str, lit_ty: &str, name: &str) -> ! {
    panic!(
        "In `modbus` attribute for `{}`, the key `{}` is not set to a {} literal.",
        name, key, lit_ty
    )
}

pub fn panic_no_key(key: &str, name: &str) -> ! {
    panic!("In `modbus` attribute for `{}`, no key `{}`", name, key)
}
