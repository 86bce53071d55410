use proc_macro::TokenStream;
use proc_macro2::{Group, TokenStream as TokenStream2, TokenTree};
use quote::{format_ident, quote, quote_spanned};
use syn::{
    Expr, FnArg, Ident, ItemFn, LitStr, Macro, Pat, punctuated::Punctuated, spanned::Spanned,
    visit_mut::VisitMut,
};

static DATA_ARG: &str = "assertions_data";
static CALLER_ARG: &str = "assertion_caller_id";

struct ProcMacFailure(TokenStream);

impl From<syn::Error> for ProcMacFailure {
    fn from(value: syn::Error) -> Self {
        Self(value.to_compile_error().into())
    }
}

/// Rewrites `kernel_assert!(cond)` into the full form carrying the kernel's
/// assertion context.
struct AssertionRewriter {
    data: Ident,
    caller: Ident,
    fn_name: LitStr,
    rewritten: usize,
}

impl AssertionRewriter {
    fn is_kernel_assert(mac: &Macro) -> bool {
        mac.path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "kernel_assert")
    }

    /// Short-form arguments prefixed with the assertion context, or `None`
    /// for anything else. The full form (`data, caller, name; cond`) does
    /// not parse as a comma list of expressions.
    ///
    /// The condition keeps its original tokens so `stringify!` prints it as
    /// written.
    fn context_args(&mut self, args: &TokenStream2) -> Option<TokenStream2> {
        let parsed = syn::parse::Parser::parse2(
            Punctuated::<Expr, syn::Token![,]>::parse_terminated,
            args.clone(),
        )
        .ok()?;
        if parsed.len() != 1 {
            return None;
        }
        let (data, caller, fn_name) = (&self.data, &self.caller, &self.fn_name);
        self.rewritten += 1;
        Some(quote! { #data, #caller, #fn_name; #args })
    }

    /// Rewrites `kernel_assert!(...)` calls found in the raw tokens of some
    /// other macro invocation.
    fn rewrite_tokens(&mut self, tokens: TokenStream2) -> TokenStream2 {
        let mut trees: Vec<TokenTree> = tokens.into_iter().collect();
        for i in 0..trees.len() {
            let TokenTree::Group(group) = &trees[i] else {
                continue;
            };
            let is_call = i >= 2
                && matches!(&trees[i - 2], TokenTree::Ident(ident) if ident == "kernel_assert")
                && matches!(&trees[i - 1], TokenTree::Punct(bang) if bang.as_char() == '!');
            let stream = group.stream();
            let rewritten = if is_call { self.context_args(&stream) } else { None };
            let stream = rewritten.unwrap_or_else(|| self.rewrite_tokens(stream));
            let mut replaced = Group::new(group.delimiter(), stream);
            replaced.set_span(group.span());
            trees[i] = TokenTree::Group(replaced);
        }
        trees.into_iter().collect()
    }
}

impl VisitMut for AssertionRewriter {
    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        let rewritten = if Self::is_kernel_assert(mac) {
            self.context_args(&mac.tokens)
        } else {
            None
        };
        mac.tokens = match rewritten {
            Some(tokens) => tokens,
            None => self.rewrite_tokens(mac.tokens.clone()),
        };
        syn::visit_mut::visit_macro_mut(self, mac);
    }

    // Nested functions don't see the kernel's parameters.
    fn visit_item_fn_mut(&mut self, _: &mut ItemFn) {}
}

fn arg_ident(arg: &FnArg) -> Option<&Ident> {
    match arg {
        FnArg::Typed(pat_ty) => match pat_ty.pat.as_ref() {
            Pat::Ident(pat_ident) => Some(&pat_ident.ident),
            _ => None,
        },
        FnArg::Receiver(_) => None,
    }
}

fn dsa_kernel_inner(attr: TokenStream, item: TokenStream) -> Result<TokenStream, ProcMacFailure> {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return Err(ProcMacFailure(
            quote_spanned! {attr.span()=>
                compile_error!("`dsa_kernel` takes no arguments");
            }
            .into(),
        ));
    }

    let mut input_fn: ItemFn = syn::parse(item)?;
    let sig = &input_fn.sig;

    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new(asyncness.span(), "kernels cannot be `async`").into());
    }
    if let Some(constness) = sig.constness {
        return Err(syn::Error::new(constness.span(), "kernels with assertions cannot be `const`").into());
    }
    if let Some(receiver) = sig.receiver() {
        return Err(syn::Error::new(receiver.span(), "kernels cannot take `self`").into());
    }
    for arg in sig.inputs.iter() {
        if let Some(ident) = arg_ident(arg) {
            if *ident == DATA_ARG || *ident == CALLER_ARG {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("`{ident}` is reserved for the assertion context added by `dsa_kernel`"),
                )
                .into());
            }
        }
    }

    let data = format_ident!("{}", DATA_ARG);
    let caller = format_ident!("{}", CALLER_ARG);
    let fn_name = LitStr::new(&sig.ident.to_string(), sig.ident.span());

    input_fn.sig.inputs.push(syn::parse_quote! {
        #data: ::core::option::Option<&::gpu_native::dsa::DeviceAssertionsData>
    });
    input_fn.sig.inputs.push(syn::parse_quote! { #caller: u32 });

    let mut rewriter = AssertionRewriter {
        data: data.clone(),
        caller: caller.clone(),
        fn_name,
        rewritten: 0,
    };
    rewriter.visit_block_mut(&mut input_fn.block);

    if rewriter.rewritten == 0 {
        input_fn
            .block
            .stmts
            .insert(0, syn::parse_quote! { let _ = (&#data, &#caller); });
    }

    Ok(quote! { #input_fn }.into())
}

/// Wires device-side assertions into a kernel.
///
/// Appends two trailing parameters, in every build mode so the kernel's
/// signature doesn't depend on whether assertions are compiled in:
///
/// * `assertions_data: Option<&DeviceAssertionsData>`, `None` when recording
///   is disabled at run time
/// * `assertion_caller_id: u32`
///
/// and rewrites each `kernel_assert!(condition)` in the body to report
/// through them, using the kernel's name as the function name. Calls inside
/// closures and inside the arguments of other macros are rewritten too;
/// calls in nested `fn` items are not, since those cannot see the kernel's
/// parameters. A call that only appears after some other macro expands
/// (for example one built by a `macro_rules!` body) is out of reach and
/// fails with the "needs an assertion context" error.
///
/// The attribute only rewrites the function. It does not turn it into a
/// device entry point: there is no `extern "ptx-kernel"` ABI and no
/// `#[unsafe(no_mangle)]`, so the kernels it produces are called directly,
/// on the host through `gpu_native::cuda::emulator::launch` or from other
/// device code.
#[proc_macro_attribute]
pub fn dsa_kernel(attr: TokenStream, item: TokenStream) -> TokenStream {
    match dsa_kernel_inner(attr, item) {
        Ok(v) | Err(ProcMacFailure(v)) => v,
    }
}
