//! eulerbench Macros
//!
//! Procedural macros that register a problem file's pieces with the harness.
//!
//! ## Macros
//!
//! - `#[eulerbench::problem]` - Problem metadata: doc text, expected answer, extra time
//! - `#[eulerbench::solve]` - A solution method (`solve` or `solve_<suffix>`)
//! - `#[eulerbench::data]` - Loader for the problem's input data

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Expr, ItemFn, ItemStruct, parse_macro_input};

// ============================================================================
// Attribute Parsing Helpers
// ============================================================================

mod attr {
    use syn::meta::ParseNestedMeta;

    /// Get the attribute name as a string
    pub fn name(meta: &ParseNestedMeta) -> String {
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    /// Parse a string literal attribute: `attr = "value"`
    pub fn string(meta: &ParseNestedMeta) -> syn::Result<syn::LitStr> {
        meta.value()?.parse()
    }

    /// Parse an expression attribute: `attr = -42`
    pub fn expr(meta: &ParseNestedMeta) -> syn::Result<syn::Expr> {
        meta.value()?.parse()
    }

    /// Create an unknown attribute error
    pub fn unknown(meta: &ParseNestedMeta, name: &str) -> syn::Error {
        meta.error(format!("unknown attribute: {}", name))
    }
}

/// Join the `///` lines of an item into one string.
///
/// Each line loses the single space rustdoc inserts after `///`.
fn doc_text(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) = &nv.value
            {
                let line = s.value();
                let line = line.strip_prefix(' ').unwrap_or(&line).to_string();
                lines.push(line);
            }
        }
    }
    lines.join("\n")
}

/// Convert `"500ms"`, `"1.5s"`, `"200us"` or `"0"` to milliseconds
fn parse_duration_ms(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.starts_with('-') {
        return None;
    }
    let (number, scale) = if let Some(v) = s.strip_suffix("ms") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("us").or_else(|| s.strip_suffix("µs")) {
        (v, 1e-3)
    } else if let Some(v) = s.strip_suffix("ns") {
        (v, 1e-6)
    } else if let Some(v) = s.strip_suffix('s') {
        (v, 1e3)
    } else {
        (s, 1.0)
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * scale)
}

// ============================================================================
// #[problem]
// ============================================================================

/// Register the problem defined in this file
///
/// The doc comment carries the problem text: its first line is the title,
/// the remaining lines the description.
///
/// # Example
///
/// ```ignore
/// /// Multiples of 3 or 5
/// ///
/// /// Find the sum of all the multiples of 3 or 5 below 1000.
/// #[eulerbench::problem(answer = 233168)]
/// pub struct Problem;
///
/// // Known to be slow: give every method 500ms more than the run timeout
/// #[eulerbench::problem(answer = 4179871, timeout_ext = "500ms")]
/// pub struct Problem;
/// ```
#[proc_macro_attribute]
pub fn problem(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let input = parse_macro_input!(item as ItemStruct);

    problem_impl(args, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn problem_impl(args: TokenStream2, input: ItemStruct) -> Result<TokenStream2, syn::Error> {
    let mut answer: Option<Expr> = None;
    let mut timeout_ext_ms = 0.0f64;

    if !args.is_empty() {
        let parser = syn::meta::parser(|meta| {
            let name = attr::name(&meta);
            match name.as_str() {
                "answer" => answer = Some(attr::expr(&meta)?),
                "timeout_ext" => {
                    let lit = attr::string(&meta)?;
                    timeout_ext_ms = parse_duration_ms(&lit.value()).ok_or_else(|| {
                        syn::Error::new_spanned(&lit, "invalid duration, expected e.g. \"500ms\"")
                    })?;
                }
                _ => return Err(attr::unknown(&meta, &name)),
            }
            Ok(())
        });
        syn::parse::Parser::parse2(parser, args)?;
    }

    let doc = doc_text(&input.attrs);
    let answer_expr = match answer {
        Some(expr) => quote! { Some(#expr) },
        None => quote! { None },
    };

    Ok(quote! {
        #[allow(dead_code)]
        #input

        ::eulerbench::internal::inventory::submit! {
            ::eulerbench::ProblemDef {
                doc: #doc,
                answer: #answer_expr,
                timeout_ext_ms: #timeout_ext_ms,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
            }
        }
    })
}

// ============================================================================
// #[solve]
// ============================================================================

/// Register a solution method
///
/// The function must be named `solve` or `solve_<suffix>`; the suffix becomes
/// the method key. It takes no argument or a `&DataHandle`, and may return
/// any integer, `Option` of one, `Result`, or `()`. The first doc line is
/// shown as the method's title.
///
/// # Example
///
/// ```ignore
/// /// Brute force
/// #[eulerbench::solve]
/// fn solve() -> u64 {
///     (1..1000).filter(|n| n % 3 == 0 || n % 5 == 0).sum()
/// }
///
/// #[eulerbench::solve]
/// fn solve_words(data: &DataHandle) -> Result<usize, DataError> {
///     Ok(data.load::<Vec<String>>()?.len())
/// }
/// ```
#[proc_macro_attribute]
pub fn solve(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    solve_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn solve_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    if !args.is_empty() {
        return Err(syn::Error::new_spanned(
            args,
            "eulerbench: #[solve] takes no arguments",
        ));
    }
    validate_method(&func)?;

    let fn_name = &func.sig.ident;
    let fn_name_str = fn_name.to_string();
    let wrapper_name = format_ident!("__euler_method_{}", fn_name);
    let doc = doc_text(&func.attrs);

    let call = if func.sig.inputs.is_empty() {
        quote! { #fn_name() }
    } else {
        quote! { #fn_name(data) }
    };

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case, unused_variables)]
        fn #wrapper_name(
            data: &::eulerbench::internal::DataHandle,
        ) -> ::eulerbench::internal::MethodResult {
            ::eulerbench::internal::IntoAnswer::into_answer(#call)
        }

        ::eulerbench::internal::inventory::submit! {
            ::eulerbench::MethodDef {
                name: #fn_name_str,
                doc: #doc,
                runner_fn: #wrapper_name,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
            }
        }
    })
}

fn validate_method(func: &ItemFn) -> syn::Result<()> {
    let name = func.sig.ident.to_string();
    if name != "solve" && !(name.starts_with("solve_") && name.len() > "solve_".len()) {
        return Err(syn::Error::new_spanned(
            &func.sig.ident,
            "eulerbench: method must be named `solve` or `solve_<suffix>`",
        ));
    }
    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &func.sig,
            "eulerbench: async methods are not supported",
        ));
    }
    if func.sig.inputs.len() > 1 {
        return Err(syn::Error::new_spanned(
            &func.sig.inputs,
            "eulerbench: method takes no argument or a single `&DataHandle`",
        ));
    }
    Ok(())
}

// ============================================================================
// #[data]
// ============================================================================

/// Register the data loader of the problem defined in this file
///
/// The loader takes no argument and returns `Result<T, E>` where `E`
/// implements `Display`. Methods receive the value through
/// `DataHandle::load::<T>()`.
///
/// # Example
///
/// ```ignore
/// #[eulerbench::data]
/// fn names() -> std::io::Result<Vec<String>> {
///     let text = std::fs::read_to_string("data/p0022_names.txt")?;
///     Ok(text.split(',').map(|s| s.trim_matches('"').to_string()).collect())
/// }
/// ```
#[proc_macro_attribute]
pub fn data(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    data_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn data_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    if !args.is_empty() {
        return Err(syn::Error::new_spanned(
            args,
            "eulerbench: #[data] takes no arguments",
        ));
    }
    if !func.sig.inputs.is_empty() || func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &func.sig,
            "eulerbench: data loader must be a plain function without arguments",
        ));
    }

    let fn_name = &func.sig.ident;
    let wrapper_name = format_ident!("__euler_data_{}", fn_name);

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name() -> ::core::result::Result<
            ::eulerbench::internal::Dataset,
            ::eulerbench::internal::DataError,
        > {
            ::eulerbench::internal::into_dataset(#fn_name())
        }

        ::eulerbench::internal::inventory::submit! {
            ::eulerbench::DataDef {
                loader: #wrapper_name,
                file: file!(),
                module_path: module_path!(),
            }
        }
    })
}
