use lrlex::{LexerDef, Pattern, Rule};

/// Keywords and punctuation. These must precede the identifier and number rules so that they win
/// when a keyword and an identifier match the same text.
const FIXED: &[(&str, &str)] = &[
    ("INT", "int"),
    ("MAIN", "main"),
    ("VOID", "void"),
    ("BREAK", "break"),
    ("DO", "do"),
    ("ELSE", "else"),
    ("IF", "if"),
    ("WHILE", "while"),
    ("RETURN", "return"),
    ("READ", "scanf"),
    ("WRITE", "printf"),
    ("LBRACE", "{"),
    ("RBRACE", "}"),
    ("LSQUARE", "["),
    ("RSQUARE", "]"),
    ("LPAR", "("),
    ("RPAR", ")"),
    ("SEMI", ";"),
    ("PLUS", "+"),
    ("MINUS", "-"),
    ("MUL_OP", "*"),
    ("DIV_OP", "/"),
    ("MOD_OP", "%"),
    ("AND_OP", "&"),
    ("OR_OP", "|"),
    ("NOT_OP", "!"),
    ("ASSIGN", "="),
    ("LT", "<"),
    ("GT", ">"),
    ("SHL_OP", "<<"),
    ("SHR_OP", ">>"),
    ("EQ", "=="),
    ("NOTEQ", "!="),
    ("LTEQ", "<="),
    ("GTEQ", ">="),
    ("ANDAND", "&&"),
    ("OROR", "||"),
    ("COMMA", ","),
];

/// Return the lexer definition for simplified C. Rules are named after the tokens of the
/// grammar but have no token IDs yet: bind them with [LexerDef::set_rule_ids]. Whitespace, and
/// any other byte no rule matches, is skipped.
pub fn c_lexerdef(end_tok_id: u32) -> LexerDef<u32> {
    let digit = Pattern::range(b'0', b'9');
    let letter = Pattern::range(b'a', b'z').union(&Pattern::range(b'A', b'Z'));

    let mut rules = FIXED
        .iter()
        .map(|(name, text)| Rule::new(None, name, &Pattern::literal(text)))
        .collect::<Vec<_>>();

    // Decimal digits, or `0x` followed by lower case hex digits.
    let hex = Pattern::literal("0x").concat(&digit.union(&Pattern::range(b'a', b'f')).iterate(1));
    rules.push(Rule::new(None, "INT_NUM", &digit.iterate(1).union(&hex)));

    // A letter followed by letters, digits and underscores.
    let id = letter.concat(
        &digit
            .union(&letter)
            .union(&Pattern::literal("_"))
            .iterate(0),
    );
    rules.push(Rule::new(None, "ID", &id));

    LexerDef::new(end_tok_id, rules)
}
