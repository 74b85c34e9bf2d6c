use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{braced, parenthesized, parse::Parse, parse_macro_input};

/// Describe the methods a type exposes to deferred invocations.
///
/// ```ignore
/// delayed::performable! {
///     struct Widget: record(id) {
///         pub fn activate();
///         pub fn rename(name: String);
///         fn recount(by: u32);
///     }
/// }
/// ```
///
/// Every listed method must take `&mut self`, accept the given arguments and
/// return `anyhow::Result<T>` where `T: Serialize`. The type itself must be
/// `Serialize`. `record(field)` marks a persisted record whose primary key is `field`.
#[proc_macro]
pub fn performable(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let def = parse_macro_input!(input as TraitImpl);
    def.into_token_stream().into()
}

struct TraitImpl {
    _struct: syn::Token!(struct),
    iden: syn::Ident,
    primary_key: Option<syn::Ident>,
    _brace_token: syn::token::Brace,
    methods: Vec<Method>,
}

impl Parse for TraitImpl {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let content;
        let _struct = input.parse()?;
        let iden = input.parse()?;
        let primary_key = if input.peek(syn::Token![:]) {
            input.parse::<syn::Token![:]>()?;
            let kind: syn::Ident = input.parse()?;
            if kind != "record" {
                return Err(syn::Error::new(kind.span(), "expected `record(<primary key>)`"));
            }
            let key;
            parenthesized!(key in input);
            Some(key.parse()?)
        } else {
            None
        };
        let _brace_token = braced!(content in input);
        let mut methods = Vec::new();
        while !content.is_empty() {
            methods.push(content.parse()?);
        }

        Ok(Self {
            _struct,
            iden,
            primary_key,
            _brace_token,
            methods,
        })
    }
}

impl ToTokens for TraitImpl {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let name = &self.iden;
        let method_infos = self.methods.iter().cloned().map(MethodTableItem);
        let match_items = self.methods.iter().cloned().map(MatchArm);

        let as_record = match &self.primary_key {
            Some(_) => quote! {
                fn as_record(&self) -> ::core::option::Option<&dyn ::delayed::core::Record> {
                    ::core::option::Option::Some(self)
                }
            },
            None => quote! {},
        };

        tokens.extend(quote! {
            impl ::delayed::core::PerformableType for #name {
                const TYPE_NAME: &'static str = stringify!(#name);
                const METHODS: &'static [::delayed::core::MethodInfo] = &[
                    #(#method_infos)*
                ];
            }

            impl ::delayed::core::Performable for #name {
                fn type_name(&self) -> &'static str {
                    <Self as ::delayed::core::PerformableType>::TYPE_NAME
                }

                fn methods(&self) -> &'static [::delayed::core::MethodInfo] {
                    <Self as ::delayed::core::PerformableType>::METHODS
                }

                fn invoke(
                    &mut self,
                    __delayed_method: &str,
                    __delayed_args: &[::delayed::serde_json::Value],
                ) -> ::delayed::anyhow::Result<::delayed::serde_json::Value> {
                    let __delayed_type_name = <Self as ::delayed::core::PerformableType>::TYPE_NAME;
                    match __delayed_method {

                        #(#match_items)*

                        _ => ::core::result::Result::Err(::delayed::InvocationError::UndefinedMethod {
                            type_name: __delayed_type_name.to_string(),
                            method: __delayed_method.to_string(),
                        }.into()),
                    }
                }

                fn state(&self) -> ::delayed::anyhow::Result<::delayed::serde_json::Value> {
                    ::core::result::Result::Ok(::delayed::serde_json::to_value(self)?)
                }

                #as_record
            }
        });

        if let Some(key) = &self.primary_key {
            tokens.extend(quote! {
                impl ::delayed::core::Record for #name {
                    fn primary_key_name(&self) -> &'static str {
                        stringify!(#key)
                    }

                    fn primary_key(&self) -> ::delayed::anyhow::Result<::delayed::serde_json::Value> {
                        ::core::result::Result::Ok(::delayed::serde_json::to_value(&self.#key)?)
                    }
                }
            });
        }
    }
}

struct MethodTableItem(Method);
impl ToTokens for MethodTableItem {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let method = &self.0;
        let name = &method.name;
        let arity = method.args.len();
        let visibility = match method.vis {
            syn::Visibility::Inherited => quote! { ::delayed::core::Visibility::Private },
            _ => quote! { ::delayed::core::Visibility::Public },
        };

        tokens.extend(quote! {
            ::delayed::core::MethodInfo {
                name: stringify!(#name),
                arity: #arity,
                visibility: #visibility,
            },
        })
    }
}

struct MatchArm(Method);
impl ToTokens for MatchArm {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let method = &self.0;
        let name = &method.name;
        let arity = method.args.len();
        // decoded values get generated names so parameters like `args` cannot shadow the inputs
        let arg_names = (0..arity)
            .map(|index| format_ident!("__delayed_arg_{}", index))
            .collect::<Vec<_>>();
        let decode_args = method
            .args
            .iter()
            .zip(&arg_names)
            .enumerate()
            .map(|(index, (arg, arg_name))| {
                let ty = &arg.ty;
                quote! {
                    let #arg_name: #ty = ::delayed::args::arg(__delayed_method, __delayed_args, #index)?;
                }
            });

        tokens.extend(quote! {
            stringify!(#name) => {
                ::delayed::args::check_arity(__delayed_type_name, __delayed_method, __delayed_args, #arity)?;
                #(#decode_args)*

                let output = self.#name(#(#arg_names),*)?;
                ::core::result::Result::Ok(::delayed::serde_json::to_value(output)?)
            },
        })
    }
}

#[derive(Clone)]
struct Method {
    vis: syn::Visibility,
    _fn: syn::Token![fn],
    name: syn::Ident,
    _paren_token: syn::token::Paren,
    args: Vec<Arg>,
    _semi: syn::Token![;],
}

impl Parse for Method {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let content;
        Ok(Self {
            vis: input.parse()?,
            _fn: input.parse()?,
            name: input.parse()?,
            _paren_token: parenthesized!(content in input),
            args: content
                .parse_terminated::<Arg, syn::Token![,]>(Arg::parse)?
                .into_iter()
                .collect(),
            _semi: input.parse()?,
        })
    }
}

#[derive(Clone)]
struct Arg {
    _name: syn::Ident,
    _colon: syn::Token![:],
    ty: syn::Type,
}

impl Parse for Arg {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        Ok(Self {
            _name: input.parse()?,
            _colon: input.parse()?,
            ty: input.parse()?,
        })
    }
}
